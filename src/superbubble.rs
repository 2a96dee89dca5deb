use rustc_hash::FxHashMap;

use log::{debug, trace};

use crate::{
    aggregate::BubbleMap,
    error::{PreconditionError, Result},
    graph::{directed_edge, SideGraph},
    sides::NodeId,
};

/// Per-vertex summary of the edges of an acyclic graph, in terms of
/// positions in a topological order.
#[derive(Debug, Default, Clone, Copy)]
struct Degrees {
    in_degree: usize,
    out_degree: usize,
    min_parent: usize,
    max_child: usize,
}

/// The nodes of an acyclic graph in topological order, along with
/// the degree summaries needed to pair entrances with exits.
struct Ordering {
    order: Vec<NodeId>,
    degrees: Vec<Degrees>,
}

impl Ordering {
    fn new<G: SideGraph + ?Sized>(graph: &G) -> Result<Self> {
        let order = graph.topological_order()?;

        let position: FxHashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut degrees = vec![
            Degrees {
                min_parent: usize::MAX,
                ..Default::default()
            };
            order.len()
        ];

        for edge in graph.edges() {
            let (from, to) = directed_edge(&edge).ok_or(
                PreconditionError::NotAcyclic {
                    node: edge.from.node,
                },
            )?;

            let from = position[&from];
            let to = position[&to];

            let d_from = &mut degrees[from];
            d_from.out_degree += 1;
            d_from.max_child = d_from.max_child.max(to);

            let d_to = &mut degrees[to];
            d_to.in_degree += 1;
            d_to.min_parent = d_to.min_parent.min(from);
        }

        Ok(Ordering { order, degrees })
    }
}

/// Find the (entrance, exit) pairs of all superbubbles in an acyclic
/// graph, in topological order of their entrances. Each entrance is
/// paired with its closest exit. Runs in time linear in the size of
/// the graph, after the topological sort.
///
/// Fails with `NotAcyclic` if the graph has a cycle, or an edge
/// joining two sides of the same orientation.
pub fn superbubble_pairs<G: SideGraph + ?Sized>(
    graph: &G,
) -> Result<Vec<(NodeId, NodeId)>> {
    let ordering = Ordering::new(graph)?;
    let pairs = find_pairs(&ordering)
        .into_iter()
        .map(|(i, j)| (ordering.order[i], ordering.order[j]))
        .collect::<Vec<_>>();

    debug!("Found {} superbubbles", pairs.len());
    Ok(pairs)
}

/// An entrance whose region is still open, and the furthest child
/// position reached from it so far.
#[derive(Debug, Clone, Copy)]
struct OpenEntrance {
    position: usize,
    reach: usize,
}

/// Pairs every entrance with its closest exit in one pass over the
/// order.
///
/// The open entrances form a stack. A vertex with a parent before an
/// entrance closes that entrance for good, and a tip closes all of
/// them. Only the top of the stack can have its region end at the
/// current vertex. Each entrance keeps the reach of the positions up
/// to the next entrance above it, and hands it down when popped.
fn find_pairs(ordering: &Ordering) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut open: Vec<OpenEntrance> = Vec::new();

    fn pop(open: &mut Vec<OpenEntrance>) {
        if let Some(top) = open.pop() {
            if let Some(below) = open.last_mut() {
                below.reach = below.reach.max(top.reach);
            }
        }
    }

    for (j, d) in ordering.degrees.iter().enumerate() {
        if d.in_degree == 0 {
            open.clear();
        } else {
            while open.last().map_or(false, |e| e.position > d.min_parent) {
                pop(&mut open);
            }
        }

        if let Some(&top) = open.last() {
            if top.reach == j {
                pairs.push((top.position, j));
                pop(&mut open);
            }
        }

        if d.out_degree == 0 {
            open.clear();
        } else {
            open.push(OpenEntrance {
                position: j,
                reach: d.max_child,
            });
        }
    }

    pairs.sort_unstable();
    pairs
}

/// Decompose an acyclic graph into superbubbles. The contents of
/// each are the nodes between its entrance and exit in the
/// topological order, both included.
pub fn superbubbles<G: SideGraph + ?Sized>(graph: &G) -> Result<BubbleMap> {
    let ordering = Ordering::new(graph)?;

    let mut map = BubbleMap::new();

    for (i, j) in find_pairs(&ordering) {
        let (entrance, exit) = (ordering.order[i], ordering.order[j]);
        trace!("superbubble {} - {}", entrance, exit);

        let mut contents = ordering.order[i..=j].to_vec();
        contents.sort_unstable();

        let key = (entrance.min(exit), entrance.max(exit));
        let entry = map.entry(key).or_default();
        entry.extend(contents);
        entry.sort_unstable();
        entry.dedup();
    }

    debug!("Found {} superbubbles", map.len());

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        graph::BidirectedGraph,
        sides::{Edge, NodeSide},
    };

    #[test]
    fn diamond() {
        let graph =
            BidirectedGraph::from_edges(vec![(1, 2), (1, 3), (2, 4), (3, 4)]);

        assert_eq!(superbubble_pairs(&graph).unwrap(), vec![(1, 4)]);

        let map = superbubbles(&graph).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&(1, 4)], vec![1, 2, 3, 4]);
    }

    #[test]
    fn nested_diamonds() {
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

        let map = superbubbles(&graph).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&(1, 4)], vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(map[&(2, 5)], vec![2, 5, 6, 7]);
    }

    #[test]
    fn single_edges_are_trivial_superbubbles() {
        let graph = BidirectedGraph::from_edges(vec![
            (0, 1),
            (1, 2),
            (1, 3),
            (2, 4),
            (3, 4),
            (4, 5),
        ]);

        let map = superbubbles(&graph).unwrap();
        let keys = map.keys().copied().collect::<Vec<_>>();
        assert_eq!(keys, vec![(0, 1), (1, 4), (4, 5)]);
        assert_eq!(map[&(0, 1)], vec![0, 1]);
    }

    #[test]
    fn bubbles_are_found_when_ids_are_not_topological() {
        let graph = BidirectedGraph::from_edges(vec![
            (20, 10),
            (20, 2),
            (10, 1),
            (10, 3),
            (1, 4),
            (3, 4),
            (2, 5),
            (5, 21),
            (4, 21),
        ]);

        assert_eq!(
            superbubble_pairs(&graph).unwrap(),
            vec![(20, 21), (10, 4), (2, 5)]
        );

        let map = superbubbles(&graph).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&(4, 10)), Some(&vec![1, 3, 4, 10]));
        assert_eq!(map.get(&(2, 5)), Some(&vec![2, 5]));
        assert_eq!(map[&(20, 21)], vec![1, 2, 3, 4, 5, 10, 20, 21]);
    }

    #[test]
    fn bubble_chain_numbered_backwards() {
        // two diamonds and an edge in a chain, inside an outer bubble
        let graph = BidirectedGraph::from_edges(vec![
            (99, 90),
            (99, 50),
            (90, 81),
            (90, 82),
            (81, 80),
            (82, 80),
            (80, 71),
            (80, 72),
            (71, 70),
            (72, 70),
            (70, 60),
            (60, 50),
        ]);

        let map = superbubbles(&graph).unwrap();
        let keys = map.keys().copied().collect::<Vec<_>>();
        assert_eq!(keys, vec![(50, 99), (60, 70), (70, 80), (80, 90)]);
        assert_eq!(map[&(80, 90)], vec![80, 81, 82, 90]);
        assert_eq!(map[&(70, 80)], vec![70, 71, 72, 80]);
        assert_eq!(map[&(60, 70)], vec![60, 70]);
    }

    #[test]
    fn tips_break_superbubbles() {
        let graph = BidirectedGraph::from_edges(vec![
            (1, 2),
            (1, 3),
            (2, 4),
            (3, 4),
            (2, 5),
        ]);

        assert!(superbubbles(&graph).unwrap().is_empty());
    }

    #[test]
    fn doubly_reversed_edges_read_forward() {
        // 2- -> 1- is the same edge as 1+ -> 2+
        let mut graph =
            BidirectedGraph::from_edges(vec![(2, 3), (1, 3)]);
        graph.add_edge(NodeSide::tail(2), NodeSide::head(1));

        let map = superbubbles(&graph).unwrap();
        assert_eq!(map[&(1, 3)], vec![1, 2, 3]);
    }

    #[test]
    fn cycles_are_rejected() {
        let graph = BidirectedGraph::from_edges(vec![
            (1, 2),
            (1, 3),
            (2, 4),
            (3, 4),
            (4, 1),
        ]);

        let err = superbubbles(&graph).unwrap_err();
        assert!(err.is_precondition());
        assert!(matches!(
            err,
            Error::Precondition(PreconditionError::NotAcyclic { .. })
        ));
    }

    #[test]
    fn inversions_are_rejected() {
        let graph = BidirectedGraph::from_side_edges(vec![
            Edge::forward(1, 2),
            Edge::new(NodeSide::head(2), NodeSide::head(3)),
        ]);

        assert!(superbubble_pairs(&graph).unwrap_err().is_precondition());
    }
}
