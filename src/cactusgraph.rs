use petgraph::prelude::*;

use fnv::{FnvHashMap, FnvHashSet};

use log::{debug, trace};

use crate::{
    components::SideComponents,
    error::{InvariantViolation, Result},
    graph::SideGraph,
    projection::Projection,
    sides::{NodeId, NodeSide},
};

/// A vertex in the cactus multigraph: one or more side components
/// merged together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CactusVertex {
    /// Lowest node ID among the merged components
    pub label: NodeId,
    /// Representative side component
    pub component: usize,
}

/// An edge in the cactus multigraph, one for each node in the input
/// graph. `sides[0]` is the side of `node` at the source endpoint of
/// the edge, and `sides[1]` the side at the target endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CactusEdge {
    pub node: NodeId,
    pub sides: [NodeSide; 2],
}

/// Edge in terms of the side components it was built from
#[derive(Debug, Clone, Copy)]
struct BaseEdge {
    from: usize,
    to: usize,
    edge: CactusEdge,
}

/// The multigraph with side components as vertices and nodes as
/// edges. `collapse` turns it into a cactus graph, where every edge
/// is on at most one cycle.
///
/// The vertices in `graph` are rebuilt after each contraction step;
/// the projection maps the original side components to the vertex
/// they have been merged into.
#[derive(Clone)]
pub struct CactusGraph {
    pub graph: UnGraph<CactusVertex, CactusEdge>,
    pub projection: Projection,
    base_edges: Vec<BaseEdge>,
    node_edge: FnvHashMap<NodeId, usize>,
    vertex_map: FnvHashMap<usize, NodeIndex>,
}

impl CactusGraph {
    /// Build the uncollapsed multigraph, with one vertex per side
    /// component, and one edge per node connecting the components of
    /// its two sides.
    pub fn from_components<G: SideGraph + ?Sized>(
        graph: &G,
        comps: &SideComponents,
    ) -> Result<Self> {
        let mut base_edges: Vec<BaseEdge> =
            Vec::with_capacity(graph.node_count());

        // the edges are undirected, so both sides of a node would
        // otherwise create one
        let mut created: FnvHashSet<NodeId> = FnvHashSet::default();

        for (i, comp) in comps.components().iter().enumerate() {
            for &side in comp.iter() {
                if created.contains(&side.node) {
                    continue;
                }
                let other_side = side.opposite();
                let j = comps.component_of(other_side).ok_or(
                    InvariantViolation::MissingCactusEdge(side.node),
                )?;

                trace!(
                    "cactus edge for sides {} -- {}: {} -> {}",
                    side,
                    other_side,
                    i,
                    j
                );

                base_edges.push(BaseEdge {
                    from: i,
                    to: j,
                    edge: CactusEdge {
                        node: side.node,
                        sides: [side, other_side],
                    },
                });
                created.insert(side.node);
            }
        }

        for node in graph.nodes() {
            if !created.contains(&node) {
                return Err(InvariantViolation::MissingCactusEdge(node).into());
            }
        }

        base_edges.sort_by_key(|e| e.edge.node);

        let node_edge = base_edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.edge.node, i))
            .collect();

        let labels = (0..comps.len())
            .map(|i| comps.lowest_node(i).unwrap_or(NodeId::MAX))
            .collect();

        let mut cactus = CactusGraph {
            graph: UnGraph::default(),
            projection: Projection::new(labels),
            base_edges,
            node_edge,
            vertex_map: FnvHashMap::default(),
        };
        cactus.rebuild();

        debug!(
            "Built multigraph with {} vertices and {} edges",
            cactus.vertex_count(),
            cactus.edge_count()
        );

        Ok(cactus)
    }

    /// Side components, multigraph, and the collapse into a cactus.
    pub fn from_graph<G: SideGraph + ?Sized>(
        graph: &G,
        source: NodeId,
        sink: NodeId,
    ) -> Result<Self> {
        let comps = SideComponents::find(graph, source, sink)?;
        let mut cactus = Self::from_components(graph, &comps)?;
        cactus.collapse();
        Ok(cactus)
    }

    /// Recreate the petgraph graph from the base edges, with every
    /// side component replaced by its current projection.
    fn rebuild(&mut self) {
        let mut graph: UnGraph<CactusVertex, CactusEdge> =
            UnGraph::with_capacity(
                self.projection.len(),
                self.base_edges.len(),
            );
        let mut vertex_map: FnvHashMap<usize, NodeIndex> =
            FnvHashMap::default();

        for comp in 0..self.projection.len() {
            let rep = self.projection.find_mut(comp);
            if !vertex_map.contains_key(&rep) {
                let label = self.projection.label(rep);
                let vx = graph.add_node(CactusVertex {
                    label,
                    component: rep,
                });
                vertex_map.insert(rep, vx);
            }
        }

        for base in self.base_edges.iter() {
            let from = vertex_map[&self.projection.find(base.from)];
            let to = vertex_map[&self.projection.find(base.to)];
            graph.add_edge(from, to, base.edge);
        }

        self.graph = graph;
        self.vertex_map = vertex_map;
    }

    /// Contract the 3-edge-connected components, then the bridges.
    pub fn collapse(&mut self) {
        self.collapse_to_cactus();
        self.collapse_bridges();
    }

    /// Merge each 3-edge-connected component into a single vertex.
    pub fn collapse_to_cactus(&mut self) {
        let edges = self
            .graph
            .edge_references()
            .filter(|e| e.source() != e.target())
            .map(|e| (e.source().index(), e.target().index()))
            .collect::<Vec<_>>();

        if edges.is_empty() {
            return;
        }

        let tec_graph =
            three_edge_connected::Graph::from_edges(edges.into_iter());

        let components =
            three_edge_connected::find_components(&tec_graph.graph);
        // singleton components don't need merging
        let components: Vec<_> =
            components.into_iter().filter(|c| c.len() > 1).collect();

        // map back from the 3EC library's vertex indices
        let components = tec_graph.invert_components(components);

        let mut merged = 0;
        for comp in components {
            let mut iter = comp.into_iter();
            if let Some(head) = iter.next() {
                let head = self.graph[NodeIndex::new(head)].component;
                for other in iter {
                    let other = self.graph[NodeIndex::new(other)].component;
                    if self.projection.union(head, other) {
                        merged += 1;
                    }
                }
            }
        }

        debug!("Merged {} vertices into 3-edge-connected components", merged);

        self.rebuild();
    }

    /// Merge the endpoints of every bridge, turning bridges into
    /// self-loops.
    pub fn collapse_bridges(&mut self) {
        let bridges = self.find_bridges();

        for &e in bridges.iter() {
            let (a, b) = self.endpoints(e);
            let a = self.graph[a].component;
            let b = self.graph[b].component;
            self.projection.union(a, b);
        }

        debug!("Collapsed {} bridges", bridges.len());

        if !bridges.is_empty() {
            self.rebuild();
        }
    }

    /// Incident edges at each vertex, without self-loops, as (edge,
    /// other endpoint) pairs.
    fn loopless_incidence(&self) -> Vec<Vec<(EdgeIndex, NodeIndex)>> {
        let mut incidence = vec![Vec::new(); self.graph.node_count()];
        for e in self.graph.edge_references() {
            let (a, b) = (e.source(), e.target());
            if a != b {
                incidence[a.index()].push((e.id(), b));
                incidence[b.index()].push((e.id(), a));
            }
        }
        incidence
    }

    /// Find the edges that are on no cycle. Parallel edges are never
    /// bridges, so the search skips the edge it arrived by rather
    /// than the parent vertex.
    pub fn find_bridges(&self) -> Vec<EdgeIndex> {
        struct Frame {
            vertex: NodeIndex,
            parent_edge: Option<EdgeIndex>,
            next: usize,
        }

        let incidence = self.loopless_incidence();
        let n = self.graph.node_count();

        let mut discovery: Vec<Option<usize>> = vec![None; n];
        let mut low: Vec<usize> = vec![0; n];
        let mut time = 0;

        let mut bridges = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        for start in self.graph.node_indices() {
            if discovery[start.index()].is_some() {
                continue;
            }

            discovery[start.index()] = Some(time);
            low[start.index()] = time;
            time += 1;

            stack.push(Frame {
                vertex: start,
                parent_edge: None,
                next: 0,
            });

            while let Some(frame) = stack.last_mut() {
                let v = frame.vertex;
                let parent_edge = frame.parent_edge;

                if let Some(&(e, w)) = incidence[v.index()].get(frame.next) {
                    frame.next += 1;

                    if Some(e) == parent_edge {
                        continue;
                    }

                    if let Some(d_w) = discovery[w.index()] {
                        low[v.index()] = low[v.index()].min(d_w);
                    } else {
                        discovery[w.index()] = Some(time);
                        low[w.index()] = time;
                        time += 1;
                        stack.push(Frame {
                            vertex: w,
                            parent_edge: Some(e),
                            next: 0,
                        });
                    }
                } else {
                    stack.pop();

                    if let (Some(e), Some(parent)) = (parent_edge, stack.last())
                    {
                        let p = parent.vertex.index();
                        low[p] = low[p].min(low[v.index()]);

                        let d_p = discovery[p].unwrap_or(0);
                        if low[v.index()] > d_p {
                            bridges.push(e);
                        }
                    }
                }
            }
        }

        bridges
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The vertex holding the source/sink connection
    pub fn root(&self) -> NodeIndex {
        self.vertex_of_component(SideComponents::ROOT)
    }

    pub fn vertex_of_component(&self, comp: usize) -> NodeIndex {
        self.vertex_map[&self.projection.find(comp)]
    }

    /// The vertex a given node side has been projected into
    pub fn vertex_of_side(&self, side: NodeSide) -> Option<NodeIndex> {
        let base = &self.base_edges[*self.node_edge.get(&side.node)?];
        let comp = if base.edge.sides[0] == side {
            base.from
        } else {
            base.to
        };
        Some(self.vertex_of_component(comp))
    }

    /// The edge standing in for the given node
    pub fn edge_of_node(&self, node: NodeId) -> Option<EdgeIndex> {
        // edges are rebuilt in base edge order
        let ix = *self.node_edge.get(&node)?;
        Some(EdgeIndex::new(ix))
    }

    /// The side components that were merged into vertex `v`.
    pub fn merged_components(&mut self, v: NodeIndex) -> Vec<usize> {
        self.projection.build_inverse();
        let rep = self.graph[v].component;
        self.projection
            .projected_from(rep)
            .map(|comps| comps.to_vec())
            .unwrap_or_default()
    }

    pub fn edge(&self, e: EdgeIndex) -> &CactusEdge {
        &self.graph[e]
    }

    pub fn vertex(&self, v: NodeIndex) -> &CactusVertex {
        &self.graph[v]
    }

    /// Panics if `e` is not an edge of the current graph.
    pub fn endpoints(&self, e: EdgeIndex) -> (NodeIndex, NodeIndex) {
        let edge = &self.graph.raw_edges()[e.index()];
        (edge.source(), edge.target())
    }

    pub fn is_self_loop(&self, e: EdgeIndex) -> bool {
        let (a, b) = self.endpoints(e);
        a == b
    }

    /// The endpoint of `e` that isn't `v`; for self-loops, `v`.
    pub fn other_endpoint(&self, e: EdgeIndex, v: NodeIndex) -> NodeIndex {
        let (a, b) = self.endpoints(e);
        if a == v {
            b
        } else {
            a
        }
    }

    /// The side of the edge's node that sits at vertex `v`.
    pub fn side_at(&self, e: EdgeIndex, v: NodeIndex) -> NodeSide {
        let (a, _) = self.endpoints(e);
        let edge = &self.graph[e];
        if a == v {
            edge.sides[0]
        } else {
            edge.sides[1]
        }
    }

    /// Edges incident to `v`, self-loops included once, in node order.
    pub fn incident_edges(&self, v: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges = self
            .graph
            .edges(v)
            .map(|e| e.id())
            .collect::<Vec<_>>();
        edges.sort_by_key(|&e| self.graph[e].node);
        edges.dedup();
        edges
    }
}
