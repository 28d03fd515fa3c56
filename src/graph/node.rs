//! Graph node implementation

use crate::core::types::{EdgeId, NodeId, Position, StateToken};

/// Graph node
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique node identifier
    pub id: NodeId,
    /// Grouping tag from the input payload
    pub layer: i64,
    /// World-space position
    pub position: Position,
    /// Current visual token
    pub state: StateToken,
    /// Touched by propagation
    pub infected: bool,
    base_state: StateToken,
    adjacent: Vec<EdgeId>,
}

impl Node {
    /// Create a new node in its base state
    pub fn new(id: NodeId, layer: i64, position: Position, base_state: StateToken) -> Self {
        Self {
            id,
            layer,
            position,
            state: base_state,
            infected: false,
            base_state,
            adjacent: Vec::new(),
        }
    }

    /// Token captured at creation; propagation never changes it
    pub fn base_state(&self) -> StateToken {
        self.base_state
    }

    /// Incident edges in insertion order
    pub fn adjacent_edges(&self) -> &[EdgeId] {
        &self.adjacent
    }

    pub(crate) fn push_edge(&mut self, edge: EdgeId) {
        self.adjacent.push(edge);
    }

    /// Whether the node differs from its base look
    pub fn is_dirty(&self) -> bool {
        self.infected || self.state != self.base_state
    }

    pub(crate) fn restore(&mut self) {
        self.state = self.base_state;
        self.infected = false;
    }
}
