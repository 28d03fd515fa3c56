//! Shared type definitions for the blackwall network
//!
//! Identifiers, edge kinds and the opaque visual tokens handed to the render
//! layer. Positions are plain `cgmath` points in world units.

use cgmath::Point3;
use serde::{Serialize, Serializer};
use std::fmt;

/// World-space position of a node
pub type Position = Point3<f64>;

/// Node identifier.
///
/// Generated nodes are numbered by their index in the input payload. The
/// central node is a distinct variant rather than a reserved number, so it can
/// never collide with a generated id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// The single distinguished root of the network
    Central,
    /// A generated node, numbered by payload index
    Index(u32),
}

/// Edge identifier: the edge's position in the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct EdgeId(pub u32);

/// How an edge came to exist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Edge taken verbatim from the input payload
    Data,
    /// Edge from the central node to a generated node
    CentralSpoke,
    /// Edge added from spatial proximity
    Synthetic,
}

/// Opaque visual category for a node or edge.
///
/// The render layer owns the mapping from token to color; the core only
/// records which category an entity is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "token", content = "value", rename_all = "snake_case")]
pub enum StateToken {
    /// The central node's own look
    Central,
    /// One entry of the node palette
    Palette(u8),
    /// Halfway mix of two palette entries (data edges)
    Blend(u8, u8),
    /// Central spoke look
    Spoke,
    /// Synthetic proximity edge look
    Synthetic,
    /// Infected look
    Corrupted,
}

impl NodeId {
    /// Whether this is the central node's id
    pub fn is_central(&self) -> bool {
        matches!(self, NodeId::Central)
    }

    /// Numeric index of a generated node
    pub fn index(&self) -> Option<u32> {
        match self {
            NodeId::Central => None,
            NodeId::Index(i) => Some(*i),
        }
    }
}

impl From<u32> for NodeId {
    fn from(index: u32) -> Self {
        NodeId::Index(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Central => write!(f, "central"),
            NodeId::Index(i) => write!(f, "{}", i),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NodeId::Central => serializer.serialize_str("central"),
            NodeId::Index(i) => serializer.serialize_u32(*i),
        }
    }
}

impl EdgeId {
    /// Position of the edge in the store's edge list
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeKind::Data => "data",
            EdgeKind::CentralSpoke => "central_spoke",
            EdgeKind::Synthetic => "synthetic",
        };
        f.write_str(name)
    }
}

impl fmt::Display for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateToken::Central => write!(f, "central"),
            StateToken::Palette(i) => write!(f, "palette[{}]", i),
            StateToken::Blend(a, b) => write!(f, "blend[{},{}]", a, b),
            StateToken::Spoke => write!(f, "spoke"),
            StateToken::Synthetic => write!(f, "synthetic"),
            StateToken::Corrupted => write!(f, "corrupted"),
        }
    }
}

impl StateToken {
    /// Base token of a data edge joining two nodes
    pub fn blend(a: StateToken, b: StateToken) -> StateToken {
        match (a, b) {
            (StateToken::Palette(x), StateToken::Palette(y)) => StateToken::Blend(x, y),
            (StateToken::Palette(x), _) | (_, StateToken::Palette(x)) => StateToken::Blend(x, x),
            _ => StateToken::Spoke,
        }
    }
}
