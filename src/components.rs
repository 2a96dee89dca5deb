use fnv::FnvHashMap;

use log::{debug, trace};

use std::collections::VecDeque;

use crate::{
    config::Config,
    error::{InvariantViolation, PreconditionError, Result},
    graph::SideGraph,
    sides::{NodeId, NodeSide, SideSet},
};

/// Pick the source and sink of the decomposition. Explicit endpoints
/// in the config win; otherwise the source is the lowest head node
/// and the sink the highest tail node.
pub fn source_sink<G: SideGraph + ?Sized>(
    graph: &G,
    config: &Config,
) -> Result<(NodeId, NodeId)> {
    if graph.node_count() == 0 {
        return Err(PreconditionError::EmptyGraph.into());
    }

    let source = match config.source {
        Some(source) => source,
        None => graph
            .head_nodes()
            .into_iter()
            .min()
            .ok_or(PreconditionError::NoSource)?,
    };

    let sink = match config.sink {
        Some(sink) => sink,
        None => graph
            .tail_nodes()
            .into_iter()
            .max()
            .ok_or(PreconditionError::NoSink)?,
    };

    for &n in [source, sink].iter() {
        if !graph.has_node(n) {
            return Err(PreconditionError::MissingNode(n).into());
        }
    }

    if source == sink {
        return Err(PreconditionError::SourceIsSink(source).into());
    }

    Ok((source, sink))
}

/// The partition of all node sides into sets that are connected by
/// edges. Component 0 always holds the tail of the source and the
/// head of the sink, which stand in for an edge closing the graph
/// into a circuit.
#[derive(Debug, Clone)]
pub struct SideComponents {
    pub source: NodeId,
    pub sink: NodeId,
    components: Vec<SideSet>,
    side_component: FnvHashMap<NodeSide, usize>,
}

impl SideComponents {
    /// Index of the component holding the source/sink connection
    pub const ROOT: usize = 0;

    pub fn find<G: SideGraph + ?Sized>(
        graph: &G,
        source: NodeId,
        sink: NodeId,
    ) -> Result<Self> {
        for &n in [source, sink].iter() {
            if !graph.has_node(n) {
                return Err(PreconditionError::MissingNode(n).into());
            }
        }

        if source == sink {
            return Err(PreconditionError::SourceIsSink(source).into());
        }

        let mut comps = SideComponents {
            source,
            sink,
            components: Vec::new(),
            side_component: FnvHashMap::default(),
        };

        let mut queue: VecDeque<NodeSide> = VecDeque::new();

        let root = comps.new_component();
        for &side in [NodeSide::tail(source), NodeSide::head(sink)].iter() {
            comps.assign(side, root)?;
            queue.push_back(side);
        }
        comps.expand(graph, root, &mut queue)?;

        for node in graph.nodes() {
            for &side in NodeSide::of_node(node).iter() {
                if comps.side_component.contains_key(&side) {
                    continue;
                }
                let comp = comps.new_component();
                comps.assign(side, comp)?;
                queue.push_back(side);
                comps.expand(graph, comp, &mut queue)?;
            }
        }

        debug!(
            "Found {} side components over {} nodes",
            comps.components.len(),
            graph.node_count()
        );

        Ok(comps)
    }

    fn new_component(&mut self) -> usize {
        self.components.push(SideSet::new());
        self.components.len() - 1
    }

    fn assign(&mut self, side: NodeSide, comp: usize) -> Result<()> {
        if self.side_component.insert(side, comp).is_some() {
            return Err(InvariantViolation::SideInTwoComponents(side).into());
        }
        self.components[comp].insert(side);
        Ok(())
    }

    /// Breadth-first over adjacent sides, adding every side not yet
    /// assigned to `comp`.
    fn expand<G: SideGraph + ?Sized>(
        &mut self,
        graph: &G,
        comp: usize,
        queue: &mut VecDeque<NodeSide>,
    ) -> Result<()> {
        while let Some(current) = queue.pop_front() {
            for adj in graph.adjacent_sides(current) {
                if !self.side_component.contains_key(&adj) {
                    trace!("side {} joins component {}", adj, comp);
                    self.assign(adj, comp)?;
                    queue.push_back(adj);
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component(&self, ix: usize) -> &SideSet {
        &self.components[ix]
    }

    pub fn components(&self) -> &[SideSet] {
        &self.components
    }

    pub fn component_of(&self, side: NodeSide) -> Option<usize> {
        self.side_component.get(&side).copied()
    }

    /// The lowest node ID with a side in the component, used as the
    /// component's label when vertices are merged.
    pub fn lowest_node(&self, ix: usize) -> Option<NodeId> {
        self.components[ix].iter().next().map(|s| s.node)
    }
}
