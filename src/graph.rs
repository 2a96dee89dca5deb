use petgraph::prelude::*;

use fnv::FnvHashSet;

use gfa::gfa::{Orientation, GFA};

use std::collections::BTreeSet;

use crate::{
    error::{PreconditionError, Result},
    sides::{Edge, NodeId, NodeSide, Side},
};

/// The operations the decomposition needs from an input graph.
/// Enumerations must be exhaustive, and `edges` must report each
/// logical edge once.
pub trait SideGraph {
    /// All node IDs, in ascending order
    fn nodes(&self) -> Vec<NodeId>;

    fn has_node(&self, id: NodeId) -> bool;

    fn node_count(&self) -> usize {
        self.nodes().len()
    }

    fn max_node_id(&self) -> Option<NodeId> {
        self.nodes().into_iter().max()
    }

    fn edges(&self) -> Vec<Edge>;

    /// The sides reachable from `side` by following exactly one edge.
    fn adjacent_sides(&self, side: NodeSide) -> Vec<NodeSide>;

    /// Nodes with no edges on their tail side.
    fn head_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .into_iter()
            .filter(|&n| self.adjacent_sides(NodeSide::tail(n)).is_empty())
            .collect()
    }

    /// Nodes with no edges on their head side.
    fn tail_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .into_iter()
            .filter(|&n| self.adjacent_sides(NodeSide::head(n)).is_empty())
            .collect()
    }

    /// The nodes in a topological order of the forward strand, such
    /// that the nodes of every superbubble form a contiguous range.
    fn topological_order(&self) -> Result<Vec<NodeId>> {
        topological_order(self)
    }
}

/// Reads a bidirected edge as a directed forward-strand edge.
/// Doubly reversed edges are flipped; edges that switch strand have
/// no forward reading.
pub fn directed_edge(edge: &Edge) -> Option<(NodeId, NodeId)> {
    match (edge.from.side, edge.to.side) {
        (Side::Head, Side::Tail) => Some((edge.from.node, edge.to.node)),
        (Side::Tail, Side::Head) => Some((edge.to.node, edge.from.node)),
        _ => None,
    }
}

/// DFS reverse postorder over the forward reading of the graph.
/// Fails if the graph has a cycle or a strand-switching edge.
///
/// The search starts only from nodes without parents, in ascending
/// order, as if a virtual source pointed at each of them. A region
/// with a single entrance is then always entered through it, so the
/// region is finished in one piece and stays contiguous.
pub fn topological_order<G: SideGraph + ?Sized>(
    graph: &G,
) -> Result<Vec<NodeId>> {
    let nodes = graph.nodes();

    let mut succs: DiGraphMap<NodeId, ()> = DiGraphMap::new();
    for &n in nodes.iter() {
        succs.add_node(n);
    }

    for edge in graph.edges() {
        let (from, to) = directed_edge(&edge).ok_or(
            PreconditionError::NotAcyclic {
                node: edge.from.node,
            },
        )?;
        if from == to {
            return Err(PreconditionError::NotAcyclic { node: from }.into());
        }
        succs.add_edge(from, to, ());
    }

    enum Inst {
        Push(NodeId),
        Pop(NodeId),
    }

    let mut visited: FnvHashSet<NodeId> = FnvHashSet::default();
    let mut in_path: FnvHashSet<NodeId> = FnvHashSet::default();
    let mut postorder: Vec<NodeId> = Vec::with_capacity(nodes.len());

    let mut stack: Vec<Inst> = Vec::new();

    let roots = nodes.iter().copied().filter(|&n| {
        succs.neighbors_directed(n, Direction::Incoming).next().is_none()
    });

    for root in roots {
        stack.push(Inst::Push(root));

        while let Some(inst) = stack.pop() {
            match inst {
                Inst::Push(n) => {
                    if in_path.contains(&n) {
                        return Err(
                            PreconditionError::NotAcyclic { node: n }.into()
                        );
                    }
                    if !visited.insert(n) {
                        continue;
                    }
                    in_path.insert(n);
                    stack.push(Inst::Pop(n));

                    let mut children = succs.neighbors(n).collect::<Vec<_>>();
                    children.sort_unstable_by(|a, b| b.cmp(a));

                    for child in children {
                        if in_path.contains(&child) {
                            return Err(PreconditionError::NotAcyclic {
                                node: child,
                            }
                            .into());
                        }
                        if !visited.contains(&child) {
                            stack.push(Inst::Push(child));
                        }
                    }
                }
                Inst::Pop(n) => {
                    in_path.remove(&n);
                    postorder.push(n);
                }
            }
        }
    }

    // whatever the roots missed sits on or behind a cycle
    if let Some(&node) = nodes.iter().find(|&&n| !visited.contains(&n)) {
        return Err(PreconditionError::NotAcyclic { node }.into());
    }

    postorder.reverse();
    Ok(postorder)
}

/// An in-memory bidirected graph. Each node contributes its two
/// sides as vertices of an undirected graph, and every edge of the
/// bidirected graph connects two of those vertices.
#[derive(Debug, Default, Clone)]
pub struct BidirectedGraph {
    nodes: BTreeSet<NodeId>,
    graph: UnGraphMap<NodeSide, ()>,
}

impl BidirectedGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a node with the given ID. Returns false if it was already
    /// present.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        let [tail, head] = NodeSide::of_node(id);
        self.graph.add_node(tail);
        self.graph.add_node(head);
        self.nodes.insert(id)
    }

    /// Add an edge between two sides. Returns None if either node is
    /// missing from the graph.
    pub fn add_edge(&mut self, from: NodeSide, to: NodeSide) -> Option<Edge> {
        if self.nodes.contains(&from.node) && self.nodes.contains(&to.node) {
            self.graph.add_edge(from, to, ());
            Some(Edge::new(from, to))
        } else {
            None
        }
    }

    /// Convenience for adding the forward edge `a -> b`, adding the
    /// nodes as well if needed.
    pub fn add_forward_edge(&mut self, a: NodeId, b: NodeId) -> Edge {
        self.add_node(a);
        self.add_node(b);
        let edge = Edge::forward(a, b);
        self.graph.add_edge(edge.from, edge.to, ());
        edge
    }

    /// Build a graph from forward `a -> b` edges.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_forward_edge(a, b);
        }
        graph
    }

    /// Build a graph from arbitrary bidirected edges; nodes are
    /// created as they are encountered.
    pub fn from_side_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_node(edge.from.node);
            graph.add_node(edge.to.node);
            graph.add_edge(edge.from, edge.to);
        }
        graph
    }

    /// Build a graph from a GFA with numeric segment names. Segment
    /// sequences are not kept.
    pub fn from_gfa(gfa: &GFA<usize, ()>) -> Self {
        let mut graph = Self::new();

        for segment in gfa.segments.iter() {
            graph.add_node(segment.name as NodeId);
        }

        for link in gfa.links.iter() {
            let from_side = if link.from_orient == Orientation::Backward {
                Side::Tail
            } else {
                Side::Head
            };
            let to_side = if link.to_orient == Orientation::Backward {
                Side::Head
            } else {
                Side::Tail
            };

            let from = NodeSide::new(link.from_segment as NodeId, from_side);
            let to = NodeSide::new(link.to_segment as NodeId, to_side);

            graph.add_node(from.node);
            graph.add_node(to.node);
            graph.add_edge(from, to);
        }

        graph
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_edge(&self, from: NodeSide, to: NodeSide) -> bool {
        self.graph.contains_edge(from, to)
    }
}

impl SideGraph for BidirectedGraph {
    fn nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }

    fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn max_node_id(&self) -> Option<NodeId> {
        self.nodes.iter().next_back().copied()
    }

    fn edges(&self) -> Vec<Edge> {
        let mut edges = self
            .graph
            .all_edges()
            .map(|(a, b, _)| Edge::new(a, b).canonical())
            .collect::<Vec<_>>();
        edges.sort();
        edges
    }

    fn adjacent_sides(&self, side: NodeSide) -> Vec<NodeSide> {
        if self.graph.contains_node(side) {
            let mut adj = self.graph.neighbors(side).collect::<Vec<_>>();
            adj.sort();
            adj
        } else {
            Vec::new()
        }
    }
}
