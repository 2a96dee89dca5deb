use petgraph::prelude::*;

use fnv::{FnvHashMap, FnvHashSet};

use log::{debug, trace, warn};

use crate::{
    cactusgraph::CactusGraph,
    error::{InvariantViolation, Result},
    sides::NodeId,
};

/// A simple cycle in the cactus graph. `vertices[0]` is the top of
/// the chain, the vertex closest to the root; edge `edges[i]` links
/// `vertices[i]` and `vertices[(i + 1) % len]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub vertices: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
}

impl Chain {
    /// Orient a cycle given as a closed walk from its top vertex, so
    /// that the walk leaves the top through the cactus edge with the
    /// lower node ID.
    fn oriented(
        cactus: &CactusGraph,
        mut vertices: Vec<NodeIndex>,
        mut edges: Vec<EdgeIndex>,
    ) -> Self {
        if let (Some(&first), Some(&last)) = (edges.first(), edges.last()) {
            let backwards = cactus.edge(last).node < cactus.edge(first).node;
            if edges.len() > 1 && backwards {
                vertices[1..].reverse();
                edges.reverse();
            }
        }
        Chain { vertices, edges }
    }

    #[inline]
    pub fn top(&self) -> NodeIndex {
        self.vertices[0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.edges.len() == 1
    }

    /// The vertices below the top, in walk order, each with the
    /// cactus edges the walk enters and leaves it by.
    pub fn links(
        &self,
    ) -> impl Iterator<Item = (NodeIndex, EdgeIndex, EdgeIndex)> + '_ {
        (1..self.vertices.len()).map(move |i| {
            (self.vertices[i], self.edges[i - 1], self.edges[i])
        })
    }
}

/// All cycles of a cactus graph, grouped by their top vertex.
#[derive(Debug, Clone)]
pub struct Chains {
    root: NodeIndex,
    chains: Vec<Chain>,
    by_top: FnvHashMap<NodeIndex, Vec<usize>>,
}

impl Chains {
    /// Depth-first from the root vertex. Every back edge closes a
    /// cycle whose top is the ancestor it reaches, and self-loops
    /// are cycles of length one.
    ///
    /// Fails if an edge is found on two cycles, i.e. the graph is
    /// not a cactus.
    pub fn find(cactus: &CactusGraph) -> Result<Self> {
        struct Frame {
            vertex: NodeIndex,
            parent_edge: Option<EdgeIndex>,
            edges: Vec<EdgeIndex>,
            next: usize,
        }

        let root = cactus.root();
        let n = cactus.vertex_count();

        let mut chains = Chains {
            root,
            chains: Vec::new(),
            by_top: FnvHashMap::default(),
        };

        let mut claimed: FnvHashSet<EdgeIndex> = FnvHashSet::default();

        let mut visited = vec![false; n];
        let mut stack_pos: Vec<Option<usize>> = vec![None; n];
        let mut stack: Vec<Frame> = Vec::new();

        visited[root.index()] = true;
        stack_pos[root.index()] = Some(0);
        stack.push(Frame {
            vertex: root,
            parent_edge: None,
            edges: cactus.incident_edges(root),
            next: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let v = frame.vertex;
            let parent_edge = frame.parent_edge;
            let next = frame.edges.get(frame.next).copied();
            frame.next += 1;

            let e = match next {
                Some(e) => e,
                None => {
                    stack_pos[v.index()] = None;
                    stack.pop();
                    continue;
                }
            };

            if parent_edge == Some(e) {
                continue;
            }

            let w = cactus.other_endpoint(e, v);

            if w == v {
                let chain = Chain {
                    vertices: vec![v],
                    edges: vec![e],
                };
                chains.add(cactus, chain, &mut claimed)?;
            } else if let Some(pos) = stack_pos[w.index()] {
                // back edge to an ancestor; the cycle is the stack
                // from the ancestor down, closed by the back edge
                let vertices =
                    stack[pos..].iter().map(|f| f.vertex).collect::<Vec<_>>();
                let mut edges = stack[pos + 1..]
                    .iter()
                    .filter_map(|f| f.parent_edge)
                    .collect::<Vec<_>>();
                edges.push(e);

                let chain = Chain::oriented(cactus, vertices, edges);
                chains.add(cactus, chain, &mut claimed)?;
            } else if !visited[w.index()] {
                visited[w.index()] = true;
                stack_pos[w.index()] = Some(stack.len());
                stack.push(Frame {
                    vertex: w,
                    parent_edge: Some(e),
                    edges: cactus.incident_edges(w),
                    next: 0,
                });
            }
            // otherwise w is a finished descendant, and e was already
            // handled as a back edge from its side
        }

        let unreachable = visited.iter().filter(|&&x| !x).count();
        if unreachable > 0 {
            warn!(
                "{} cactus vertices are not reachable from the root, \
                 their bubbles are left out",
                unreachable
            );
        }

        debug!(
            "Found {} chains at {} top vertices",
            chains.chains.len(),
            chains.by_top.len()
        );

        Ok(chains)
    }

    fn add(
        &mut self,
        cactus: &CactusGraph,
        chain: Chain,
        claimed: &mut FnvHashSet<EdgeIndex>,
    ) -> Result<()> {
        for &e in chain.edges.iter() {
            if !claimed.insert(e) {
                let node = cactus.edge(e).node;
                return Err(InvariantViolation::EdgeInTwoCycles(node).into());
            }
        }

        trace!(
            "chain of length {} at vertex {}",
            chain.len(),
            chain.top().index()
        );

        let ix = self.chains.len();
        self.by_top.entry(chain.top()).or_default().push(ix);
        self.chains.push(chain);
        Ok(())
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter()
    }

    /// The chains whose top is the given vertex, in discovery order
    pub fn at_top(&self, vertex: NodeIndex) -> impl Iterator<Item = &Chain> {
        self.by_top
            .get(&vertex)
            .into_iter()
            .flat_map(move |ixs| ixs.iter().map(move |&i| &self.chains[i]))
    }

    /// The nodes of every chain hanging from the given vertex,
    /// combined across chains.
    pub fn nodes_at_top(
        &self,
        cactus: &CactusGraph,
        vertex: NodeIndex,
    ) -> Vec<NodeId> {
        self.at_top(vertex)
            .flat_map(|chain| chain.edges.iter())
            .map(|&e| cactus.edge(e).node)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::BidirectedGraph, sides::NodeSide};

    fn chain_nodes(cactus: &CactusGraph, chain: &Chain) -> Vec<NodeId> {
        chain.edges.iter().map(|&e| cactus.edge(e).node).collect()
    }

    #[test]
    fn diamond_chains() {
        let graph =
            BidirectedGraph::from_edges(vec![(1, 2), (1, 3), (2, 4), (3, 4)]);
        let cactus = CactusGraph::from_graph(&graph, 1, 4).unwrap();
        let chains = Chains::find(&cactus).unwrap();

        assert_eq!(chains.len(), 3);

        let root = chains.root();
        let at_root = chains.at_top(root).collect::<Vec<_>>();
        assert_eq!(at_root.len(), 1);
        assert_eq!(chain_nodes(&cactus, at_root[0]), vec![1, 4]);

        let inner = cactus.vertex_of_side(NodeSide::head(1)).unwrap();
        let links = at_root[0].links().collect::<Vec<_>>();
        assert_eq!(links.len(), 1);
        let (v, entering, leaving) = links[0];
        assert_eq!(v, inner);
        assert_eq!(cactus.side_at(entering, v), NodeSide::head(1));
        assert_eq!(cactus.side_at(leaving, v), NodeSide::tail(4));

        assert!(chains.at_top(inner).all(|c| c.is_self_loop()));
        assert_eq!(chains.nodes_at_top(&cactus, inner), vec![2, 3]);
        assert_eq!(chains.nodes_at_top(&cactus, root), vec![1, 4]);
    }

    #[test]
    fn longer_cycles_leave_the_top_by_the_lower_node() {
        // three bubbles in a row, all on one cycle through the root
        let graph = BidirectedGraph::from_edges(vec![
            (0, 1),
            (1, 2),
            (1, 3),
            (2, 4),
            (3, 4),
            (4, 5),
        ]);
        let cactus = CactusGraph::from_graph(&graph, 0, 5).unwrap();
        let chains = Chains::find(&cactus).unwrap();

        let root = chains.root();
        let at_root = chains.at_top(root).collect::<Vec<_>>();
        assert_eq!(at_root.len(), 1);

        let chain = at_root[0];
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.vertices.len(), 4);
        assert_eq!(chain_nodes(&cactus, chain), vec![0, 1, 4, 5]);

        let boundaries = chain
            .links()
            .map(|(v, a, b)| (cactus.side_at(a, v), cactus.side_at(b, v)))
            .collect::<Vec<_>>();
        assert_eq!(
            boundaries,
            vec![
                (NodeSide::head(0), NodeSide::tail(1)),
                (NodeSide::head(1), NodeSide::tail(4)),
                (NodeSide::head(4), NodeSide::tail(5)),
            ]
        );
    }

    #[test]
    fn several_chains_at_one_vertex() {
        // nested diamonds, with the inner one on a cycle at the
        // same vertex as the self-loop of 3
        let graph = BidirectedGraph::from_edges(vec![
            (1, 2),
            (1, 3),
            (2, 6),
            (2, 7),
            (6, 5),
            (7, 5),
            (5, 4),
            (3, 4),
        ]);
        let cactus = CactusGraph::from_graph(&graph, 1, 4).unwrap();
        let chains = Chains::find(&cactus).unwrap();

        let outer = cactus.vertex_of_side(NodeSide::head(1)).unwrap();
        assert_eq!(chains.at_top(outer).count(), 2);
        let mut nodes = chains.nodes_at_top(&cactus, outer);
        nodes.sort();
        assert_eq!(nodes, vec![2, 3, 5]);

        let inner = cactus.vertex_of_side(NodeSide::head(2)).unwrap();
        assert_eq!(chains.nodes_at_top(&cactus, inner), vec![6, 7]);
    }

    #[test]
    fn every_edge_on_at_most_one_chain() {
        let graph = BidirectedGraph::from_edges(vec![
            (1, 2),
            (1, 3),
            (2, 4),
            (3, 4),
            (4, 5),
            (4, 6),
            (5, 7),
            (6, 7),
            (2, 8),
        ]);
        let cactus = CactusGraph::from_graph(&graph, 1, 7).unwrap();
        let chains = Chains::find(&cactus).unwrap();

        let mut seen = FnvHashSet::default();
        for chain in chains.iter() {
            for &e in chain.edges.iter() {
                assert!(seen.insert(e));
            }
        }
        // after collapsing bridges, every edge is on a cycle
        assert_eq!(seen.len(), cactus.edge_count());
    }
}
