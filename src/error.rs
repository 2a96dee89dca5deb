use thiserror::Error;

use crate::sides::{NodeId, NodeSide};

/// Problems with the input graph, detected before any traversal
/// starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("graph has no nodes")]
    EmptyGraph,
    #[error("graph has no head node to use as source")]
    NoSource,
    #[error("graph has no tail node to use as sink")]
    NoSink,
    #[error("source and sink are the same node ({0})")]
    SourceIsSink(NodeId),
    #[error("node {0} is not in the graph")]
    MissingNode(NodeId),
    #[error("graph is not acyclic (at node {node})")]
    NotAcyclic { node: NodeId },
}

/// Broken internal invariants. These indicate a bug, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("node side {0} was assigned to two components")]
    SideInTwoComponents(NodeSide),
    #[error("no cactus edge was created for node {0}")]
    MissingCactusEdge(NodeId),
    #[error("cactus edge for node {0} lies on more than one cycle")]
    EdgeInTwoCycles(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),
    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl Error {
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::Precondition(_))
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
