use std::ops::{Index, IndexMut};

use log::{debug, trace};

use crate::{
    cactusgraph::CactusGraph,
    chains::Chains,
    sides::{NodeId, NodeSide},
};

/// Index of a bubble in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BubbleId(pub usize);

/// A region bounded by two node sides, and the nodes it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub start: NodeSide,
    pub end: NodeSide,
    pub contents: Vec<NodeId>,
}

impl Bubble {
    pub fn new(start: NodeSide, end: NodeSide, contents: Vec<NodeId>) -> Self {
        Bubble {
            start,
            end,
            contents,
        }
    }

    /// The boundary nodes as an unordered pair, lowest first
    #[inline]
    pub fn boundary(&self) -> (NodeId, NodeId) {
        let (a, b) = (self.start.node, self.end.node);
        (a.min(b), a.max(b))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.contents.contains(&node)
    }
}

#[derive(Debug, Clone)]
struct BubbleNode {
    bubble: Bubble,
    parent: Option<BubbleId>,
    children: Vec<BubbleId>,
    depth: usize,
}

/// Rooted tree of bubbles, stored as a flat arena. The root spans the
/// whole graph between the source and sink, and every other bubble
/// is nested in its parent.
#[derive(Debug, Clone)]
pub struct BubbleTree {
    nodes: Vec<BubbleNode>,
}

impl BubbleTree {
    pub fn new(root: Bubble) -> Self {
        BubbleTree {
            nodes: vec![BubbleNode {
                bubble: root,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
        }
    }

    /// Walk the chains of a cactus graph from the root vertex down,
    /// creating one bubble for every vertex a chain passes through
    /// below its top.
    ///
    /// A bubble's contents are its two boundary nodes and the nodes
    /// on all the chains hanging from its vertex. Nodes further down
    /// are only added when the contents are aggregated.
    pub fn from_cactus(
        cactus: &CactusGraph,
        chains: &Chains,
        source: NodeId,
        sink: NodeId,
    ) -> Self {
        let root_vertex = chains.root();

        let mut tree = BubbleTree::new(Bubble::new(
            NodeSide::tail(source),
            NodeSide::head(sink),
            chains.nodes_at_top(cactus, root_vertex),
        ));

        let mut worklist = vec![(root_vertex, tree.root())];

        while let Some((vertex, parent)) = worklist.pop() {
            // self-loops have no vertex below the top, and add their
            // node to the contents of the top only
            for chain in chains.at_top(vertex).filter(|c| !c.is_self_loop()) {
                for (v, entering, leaving) in chain.links() {
                    let start = cactus.side_at(entering, v);
                    let end = cactus.side_at(leaving, v);

                    let mut contents = vec![start.node];
                    contents.extend(chains.nodes_at_top(cactus, v));
                    contents.push(end.node);

                    trace!("bubble {} - {} under {}", start, end, parent.0);

                    let bubble = Bubble::new(start, end, contents);
                    let child = tree.add_child(parent, bubble);
                    worklist.push((v, child));
                }
            }
        }

        debug!("Built bubble tree with {} bubbles", tree.len());

        tree
    }

    pub fn add_child(&mut self, parent: BubbleId, bubble: Bubble) -> BubbleId {
        let id = BubbleId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(BubbleNode {
            bubble,
            parent: Some(parent),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    #[inline]
    pub fn root(&self) -> BubbleId {
        BubbleId(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.nodes.get(id.0).map(|n| &n.bubble)
    }

    pub fn parent(&self, id: BubbleId) -> Option<BubbleId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: BubbleId) -> &[BubbleId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth(&self, id: BubbleId) -> Option<usize> {
        self.nodes.get(id.0).map(|n| n.depth)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BubbleId, &Bubble)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (BubbleId(i), &n.bubble))
    }

    /// Every bubble before its children, children in insertion order.
    pub fn preorder(&self) -> Vec<BubbleId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }

        order
    }

    /// Every bubble after all of its children.
    pub fn postorder(&self) -> Vec<BubbleId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().copied());
        }

        order.reverse();
        order
    }

    /// The bubbles on the path from `id` up to and including the root
    pub fn ancestors(&self, id: BubbleId) -> Vec<BubbleId> {
        let mut path = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            path.push(p);
            current = self.parent(p);
        }
        path
    }
}

impl Index<BubbleId> for BubbleTree {
    type Output = Bubble;

    fn index(&self, id: BubbleId) -> &Bubble {
        &self.nodes[id.0].bubble
    }
}

impl IndexMut<BubbleId> for BubbleTree {
    fn index_mut(&mut self, id: BubbleId) -> &mut Bubble {
        &mut self.nodes[id.0].bubble
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::BidirectedGraph;

    fn tree_for(edges: Vec<(u64, u64)>, source: u64, sink: u64) -> BubbleTree {
        let graph = BidirectedGraph::from_edges(edges);
        let cactus = CactusGraph::from_graph(&graph, source, sink).unwrap();
        let chains = Chains::find(&cactus).unwrap();
        BubbleTree::from_cactus(&cactus, &chains, source, sink)
    }

    fn sorted(mut v: Vec<NodeId>) -> Vec<NodeId> {
        v.sort();
        v
    }

    fn simple_tree() -> BubbleTree {
        let side = NodeSide::tail;
        let mut tree = BubbleTree::new(Bubble::new(side(1), side(9), vec![]));
        let root = tree.root();
        let a = tree.add_child(root, Bubble::new(side(2), side(3), vec![]));
        let b = tree.add_child(root, Bubble::new(side(4), side(5), vec![]));
        tree.add_child(a, Bubble::new(side(6), side(7), vec![]));
        tree.add_child(b, Bubble::new(side(8), side(10), vec![]));
        tree
    }

    #[test]
    fn tree_navigation() {
        let tree = simple_tree();
        let root = tree.root();

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.children(root), &[BubbleId(1), BubbleId(2)]);
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.parent(BubbleId(3)), Some(BubbleId(1)));
        assert_eq!(tree.depth(BubbleId(4)), Some(2));
        assert_eq!(tree.ancestors(BubbleId(4)), vec![BubbleId(2), root]);
        assert_eq!(tree[BubbleId(4)].boundary(), (8, 10));
        assert!(tree.get(BubbleId(5)).is_none());
        assert!(tree.children(BubbleId(5)).is_empty());
    }

    #[test]
    fn traversal_orders() {
        let tree = simple_tree();

        let pre = tree.preorder();
        let expected: Vec<BubbleId> =
            [0, 1, 3, 2, 4].iter().map(|&i| BubbleId(i)).collect();
        assert_eq!(pre, expected);

        let post = tree.postorder();
        assert_eq!(post.len(), tree.len());
        assert_eq!(post.last(), Some(&tree.root()));

        for (i, &id) in post.iter().enumerate() {
            for child in tree.children(id) {
                let child_pos = post.iter().position(|x| x == child).unwrap();
                assert!(child_pos < i);
            }
        }
    }

    #[test]
    fn diamond_tree() {
        let tree = tree_for(vec![(1, 2), (1, 3), (2, 4), (3, 4)], 1, 4);

        assert_eq!(tree.len(), 2);

        let root = &tree[tree.root()];
        assert_eq!(root.start, NodeSide::tail(1));
        assert_eq!(root.end, NodeSide::head(4));
        assert_eq!(sorted(root.contents.clone()), vec![1, 4]);

        let children = tree.children(tree.root());
        assert_eq!(children.len(), 1);

        let bubble = &tree[children[0]];
        assert_eq!(bubble.start, NodeSide::head(1));
        assert_eq!(bubble.end, NodeSide::tail(4));
        assert_eq!(bubble.contents, vec![1, 2, 3, 4]);
    }

    #[test]
    fn nested_diamond_tree() {
        let tree = tree_for(
            vec![
                (1, 2),
                (1, 3),
                (2, 6),
                (2, 7),
                (6, 5),
                (7, 5),
                (5, 4),
                (3, 4),
            ],
            1,
            4,
        );

        assert_eq!(tree.len(), 3);

        let outer = tree.children(tree.root())[0];
        assert_eq!(tree[outer].boundary(), (1, 4));
        // both chains at the outer vertex contribute
        assert_eq!(sorted(tree[outer].contents.clone()), vec![1, 2, 3, 4, 5]);

        let inner = tree.children(outer)[0];
        assert_eq!(tree[inner].start, NodeSide::head(2));
        assert_eq!(tree[inner].end, NodeSide::tail(5));
        assert_eq!(sorted(tree[inner].contents.clone()), vec![2, 5, 6, 7]);
        assert_eq!(tree.depth(inner), Some(2));
    }

    #[test]
    fn bubbles_in_series_are_siblings() {
        let tree = tree_for(
            vec![(0, 1), (1, 2), (1, 3), (2, 4), (3, 4), (4, 5)],
            0,
            5,
        );

        let children = tree.children(tree.root());
        let boundaries = children
            .iter()
            .map(|&c| tree[c].boundary())
            .collect::<Vec<_>>();
        assert_eq!(boundaries, vec![(0, 1), (1, 4), (4, 5)]);

        assert_eq!(tree[children[0]].contents, vec![0, 1]);
        let contents = sorted(tree[children[1]].contents.clone());
        assert_eq!(contents, vec![1, 2, 3, 4]);
        assert_eq!(tree[children[2]].contents, vec![4, 5]);
    }
}
