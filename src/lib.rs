pub mod aggregate;
pub mod bubbletree;
pub mod cactusgraph;
pub mod chains;
pub mod components;
pub mod config;
pub mod error;
pub mod graph;
pub mod projection;
pub mod sides;
pub mod superbubble;

pub use aggregate::{aggregate_contents, bubble_map, BubbleMap};
pub use bubbletree::{Bubble, BubbleId, BubbleTree};
pub use components::source_sink;
pub use config::Config;
pub use error::{Error, InvariantViolation, PreconditionError, Result};
pub use graph::{BidirectedGraph, SideGraph};
pub use sides::{Edge, NodeId, NodeSide, Side};
pub use superbubble::{superbubble_pairs, superbubbles};

use cactusgraph::CactusGraph;
use chains::Chains;

/// Build the bubble tree of a graph from its cactus graph, before
/// contents are aggregated. Each bubble holds its boundary nodes and
/// the nodes directly on the chains below it.
///
/// The intermediate multigraph is dropped before returning.
pub fn cactus_bubble_tree<G: SideGraph + ?Sized>(
    graph: &G,
    config: &Config,
) -> Result<BubbleTree> {
    let (source, sink) = source_sink(graph, config)?;
    log::debug!("Decomposing with source {} and sink {}", source, sink);

    let cactus = CactusGraph::from_graph(graph, source, sink)?;
    let chains = Chains::find(&cactus)?;

    Ok(BubbleTree::from_cactus(&cactus, &chains, source, sink))
}

/// Find the bubbles of a bidirected graph, cyclic or not, using the
/// default source and sink.
pub fn cactus_bubbles<G: SideGraph + ?Sized>(graph: &G) -> Result<BubbleMap> {
    cactus_bubbles_with(graph, &Config::default())
}

pub fn cactus_bubbles_with<G: SideGraph + ?Sized>(
    graph: &G,
    config: &Config,
) -> Result<BubbleMap> {
    let mut tree = cactus_bubble_tree(graph, config)?;
    aggregate_contents(&mut tree);
    Ok(bubble_map(&tree))
}
