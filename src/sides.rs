use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a node in the input graph.
pub type NodeId = u64;

/// One of the two ends of a node. A forward traversal of a node
/// enters through its `Tail` and leaves through its `Head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Tail,
    Head,
}

impl Side {
    #[inline]
    pub fn opposite(&self) -> Self {
        match self {
            Side::Tail => Side::Head,
            Side::Head => Side::Tail,
        }
    }

    #[inline]
    pub fn is_head(&self) -> bool {
        *self == Side::Head
    }
}

/// A connection point of a node in a bidirected graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeSide {
    pub node: NodeId,
    pub side: Side,
}

impl NodeSide {
    #[inline]
    pub fn new(node: NodeId, side: Side) -> Self {
        NodeSide { node, side }
    }

    #[inline]
    pub fn tail(node: NodeId) -> Self {
        NodeSide::new(node, Side::Tail)
    }

    #[inline]
    pub fn head(node: NodeId) -> Self {
        NodeSide::new(node, Side::Head)
    }

    /// The other side of the same node
    #[inline]
    pub fn opposite(&self) -> Self {
        NodeSide {
            node: self.node,
            side: self.side.opposite(),
        }
    }

    #[inline]
    pub fn is_head(&self) -> bool {
        self.side.is_head()
    }

    /// Both sides of a node, tail first
    #[inline]
    pub fn of_node(node: NodeId) -> [NodeSide; 2] {
        [NodeSide::tail(node), NodeSide::head(node)]
    }
}

impl fmt::Display for NodeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self.side {
            Side::Tail => "t",
            Side::Head => "h",
        };
        write!(f, "{}{}", self.node, s)
    }
}

/// An edge in a bidirected graph, connecting two node sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub from: NodeSide,
    pub to: NodeSide,
}

impl Edge {
    #[inline]
    pub fn new(from: NodeSide, to: NodeSide) -> Self {
        Edge { from, to }
    }

    /// The edge a forward walk takes from `a` into `b`
    #[inline]
    pub fn forward(a: NodeId, b: NodeId) -> Self {
        Edge::new(NodeSide::head(a), NodeSide::tail(b))
    }

    /// An edge and its reverse reading connect the same pair of
    /// sides; this returns the reading with the smaller side first.
    #[inline]
    pub fn canonical(&self) -> Self {
        let from = self.from.min(self.to);
        let to = self.from.max(self.to);
        Edge { from, to }
    }

    /// Given one side of the edge, return the side at the other end.
    #[inline]
    pub fn other_side(&self, side: NodeSide) -> Option<NodeSide> {
        if side == self.from {
            Some(self.to)
        } else if side == self.to {
            Some(self.from)
        } else {
            None
        }
    }
}

pub type SideSet = BTreeSet<NodeSide>;
