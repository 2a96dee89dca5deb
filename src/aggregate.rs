use std::collections::BTreeMap;

use log::debug;

use crate::{bubbletree::BubbleTree, sides::NodeId};

/// Bubbles keyed by their boundary nodes, lowest first, mapped to the
/// sorted nodes they contain.
pub type BubbleMap = BTreeMap<(NodeId, NodeId), Vec<NodeId>>;

/// Add the contents of every bubble to its parent, bottom-up, so that
/// each bubble holds all nodes nested anywhere inside it. Contents
/// end up sorted and without duplicates.
pub fn aggregate_contents(tree: &mut BubbleTree) {
    for id in tree.postorder() {
        let mut nested: Vec<NodeId> = Vec::new();
        for &child in tree.children(id) {
            nested.extend_from_slice(&tree[child].contents);
        }

        let contents = &mut tree[id].contents;
        contents.extend(nested);
        contents.sort_unstable();
        contents.dedup();
    }
}

/// Flatten the tree into a map from boundary pairs to contents.
///
/// The root is left out, as is any bubble bounded by the source and
/// sink themselves, since these only restate the whole graph. Bubbles
/// sharing a boundary pair have their contents merged.
pub fn bubble_map(tree: &BubbleTree) -> BubbleMap {
    let root = tree.root();
    let outer = tree[root].boundary();

    let mut map = BubbleMap::new();

    for id in tree.preorder() {
        if id == root {
            continue;
        }

        let bubble = &tree[id];
        let key = bubble.boundary();
        if key == outer {
            continue;
        }

        let entry = map.entry(key).or_default();
        entry.extend_from_slice(&bubble.contents);
        entry.sort_unstable();
        entry.dedup();
    }

    debug!("Flattened {} bubbles into {} entries", tree.len(), map.len());

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bubbletree::{Bubble, BubbleId},
        sides::NodeSide,
    };

    fn bubble(a: NodeId, b: NodeId, contents: &[NodeId]) -> Bubble {
        Bubble::new(NodeSide::head(a), NodeSide::tail(b), contents.to_vec())
    }

    fn example_tree() -> BubbleTree {
        let mut tree = BubbleTree::new(Bubble::new(
            NodeSide::tail(1),
            NodeSide::head(20),
            vec![1, 20],
        ));
        let root = tree.root();
        let a = tree.add_child(root, bubble(1, 10, &[1, 3, 2, 10]));
        tree.add_child(root, bubble(10, 20, &[10, 20]));
        let c = tree.add_child(a, bubble(3, 6, &[3, 5, 4, 6]));
        tree.add_child(c, bubble(4, 5, &[4, 8, 7, 5]));
        tree
    }

    #[test]
    fn contents_bubble_up() {
        let mut tree = example_tree();
        aggregate_contents(&mut tree);

        assert_eq!(
            tree[tree.root()].contents,
            vec![1, 2, 3, 4, 5, 6, 7, 8, 10, 20]
        );
        assert_eq!(
            tree[BubbleId(1)].contents,
            vec![1, 2, 3, 4, 5, 6, 7, 8, 10]
        );
        assert_eq!(tree[BubbleId(3)].contents, vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(tree[BubbleId(4)].contents, vec![4, 5, 7, 8]);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut tree = example_tree();
        aggregate_contents(&mut tree);
        let once = tree.clone();
        aggregate_contents(&mut tree);

        for (id, bubble) in once.iter() {
            assert_eq!(bubble, &tree[id]);
        }
    }

    #[test]
    fn children_are_subsets_after_aggregation() {
        let mut tree = example_tree();
        aggregate_contents(&mut tree);

        for (id, bubble) in tree.iter() {
            if let Some(parent) = tree.parent(id) {
                let parent = &tree[parent];
                assert!(bubble.contents.iter().all(|n| parent.contains(*n)));
            }
        }
    }

    #[test]
    fn map_excludes_root_and_outer_boundary() {
        let mut tree = example_tree();
        // restates the whole graph
        tree.add_child(tree.root(), bubble(20, 1, &[1, 20]));
        aggregate_contents(&mut tree);

        let map = bubble_map(&tree);
        let keys = map.keys().copied().collect::<Vec<_>>();
        assert_eq!(keys, vec![(1, 10), (3, 6), (4, 5), (10, 20)]);
        assert_eq!(map[&(3, 6)], vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn shared_boundaries_are_merged() {
        let mut tree = example_tree();
        tree.add_child(BubbleId(1), bubble(6, 3, &[3, 6, 9]));
        aggregate_contents(&mut tree);

        let map = bubble_map(&tree);
        assert_eq!(map[&(3, 6)], vec![3, 4, 5, 6, 7, 8, 9]);
    }
}
