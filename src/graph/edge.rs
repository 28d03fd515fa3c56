//! Graph edge implementation

use crate::core::types::{EdgeId, EdgeKind, NodeId, StateToken};

/// Graph edge
#[derive(Debug, Clone)]
pub struct Edge {
    /// Unique edge identifier
    pub id: EdgeId,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Where the edge came from
    pub kind: EdgeKind,
    /// Current visual token
    pub state: StateToken,
    /// Touched by propagation
    pub infected: bool,
    base_state: StateToken,
}

impl Edge {
    /// Create a new edge in its base state
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, kind: EdgeKind, base_state: StateToken) -> Self {
        Self {
            id,
            source,
            target,
            kind,
            state: base_state,
            infected: false,
            base_state,
        }
    }

    /// Token captured at creation
    pub fn base_state(&self) -> StateToken {
        self.base_state
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }

    /// Whether the edge joins `a` and `b` in either direction
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// Whether the edge differs from its base look
    pub fn is_dirty(&self) -> bool {
        self.infected || self.state != self.base_state
    }

    pub(crate) fn restore(&mut self) {
        self.state = self.base_state;
        self.infected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_end() {
        let edge = Edge::new(EdgeId(0), NodeId::Central, NodeId::Index(4), EdgeKind::CentralSpoke, StateToken::Spoke);
        assert_eq!(edge.other_end(NodeId::Central), Some(NodeId::Index(4)));
        assert_eq!(edge.other_end(NodeId::Index(4)), Some(NodeId::Central));
        assert_eq!(edge.other_end(NodeId::Index(5)), None);
        assert!(edge.connects(NodeId::Index(4), NodeId::Central));
    }

    #[test]
    fn test_restore() {
        let mut edge = Edge::new(EdgeId(1), NodeId::Index(0), NodeId::Index(1), EdgeKind::Data, StateToken::Blend(0, 1));
        edge.infected = true;
        edge.state = StateToken::Corrupted;
        assert!(edge.is_dirty());
        edge.restore();
        assert!(!edge.is_dirty());
        assert_eq!(edge.state, StateToken::Blend(0, 1));
    }
}
