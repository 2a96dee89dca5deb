use crate::sides::NodeId;

/// Options for the cactus decomposition. Unset endpoints are picked
/// from the graph: the lowest head node becomes the source, and the
/// highest tail node the sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub source: Option<NodeId>,
    pub sink: Option<NodeId>,
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_source(mut self, source: NodeId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_sink(mut self, sink: NodeId) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_source_sink(self, source: NodeId, sink: NodeId) -> Self {
        self.with_source(source).with_sink(sink)
    }
}
