//! Outbound events for the render layer
//!
//! The render layer owns every color and effect decision; these events only
//! say which entity changed to which token and when a run starts or ends.

use crate::core::types::{EdgeId, NodeId, Position, StateToken};
use serde::Serialize;
use std::fmt;

/// Event emitted by propagation and session lifecycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    /// A node's token changed
    NodeStateChanged {
        /// Node
        id: NodeId,
        /// New token
        token: StateToken,
        /// Strength of the change, 0 for a restore
        intensity: f64,
    },
    /// An edge's token changed
    EdgeStateChanged {
        /// Edge
        id: EdgeId,
        /// New token
        token: StateToken,
    },
    /// A traversal or think run finished
    TraversalComplete {
        /// Whether it ended in the success state
        success: bool,
    },
    /// All tokens are back to base
    ResetComplete,
    /// Ripple effect centered on a node
    CorruptionWave {
        /// Node at the center of the ripple
        id: NodeId,
        /// Run progress in `[0, 1]`
        progress: f64,
    },
    /// Central node heartbeat on every wave step
    CentralPulse {
        /// Run progress in `[0, 1]`
        progress: f64,
    },
    /// Sampled orb position
    OrbMoved {
        /// World-space coordinates
        position: [f64; 3],
    },
    /// Terminal success notification
    CorruptionDetected,
    /// The graph is about to be torn down
    BigBang,
    /// A fresh graph replaced the old one
    NetworkRebuilt {
        /// Nodes in the new graph
        nodes: usize,
        /// Edges in the new graph
        edges: usize,
    },
}

impl RenderEvent {
    /// Orb position event
    pub fn orb_moved(position: Position) -> Self {
        Self::OrbMoved {
            position: [position.x, position.y, position.z],
        }
    }

    /// Whether this event ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TraversalComplete { .. })
    }
}

impl fmt::Display for RenderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeStateChanged { id, token, intensity } => {
                write!(f, "node {} -> {} ({:.2})", id, token, intensity)
            }
            Self::EdgeStateChanged { id, token } => write!(f, "edge {} -> {}", id, token),
            Self::TraversalComplete { success } => write!(f, "traversal complete (success: {})", success),
            Self::ResetComplete => write!(f, "reset complete"),
            Self::CorruptionWave { id, progress } => write!(f, "corruption wave at {} ({:.2})", id, progress),
            Self::CentralPulse { progress } => write!(f, "central pulse ({:.2})", progress),
            Self::OrbMoved { position } => {
                write!(f, "orb at ({:.1}, {:.1}, {:.1})", position[0], position[1], position[2])
            }
            Self::CorruptionDetected => write!(f, "corruption detected"),
            Self::BigBang => write!(f, "big bang"),
            Self::NetworkRebuilt { nodes, edges } => {
                write!(f, "network rebuilt ({} nodes, {} edges)", nodes, edges)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let event = RenderEvent::NodeStateChanged {
            id: NodeId::Central,
            token: StateToken::Corrupted,
            intensity: 1.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "node_state_changed");
        assert_eq!(json["id"], "central");
        assert_eq!(json["intensity"], 1.0);

        let json = serde_json::to_value(RenderEvent::TraversalComplete { success: false }).unwrap();
        assert_eq!(json["event"], "traversal_complete");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_orb_moved_flattens_position() {
        let event = RenderEvent::orb_moved(Position::new(1.0, 2.0, 3.0));
        assert_eq!(event, RenderEvent::OrbMoved { position: [1.0, 2.0, 3.0] });
        assert!(!event.is_terminal());
        assert!(RenderEvent::TraversalComplete { success: true }.is_terminal());
    }
}
