//! Error types and handling for the blackwall network
//!
//! Build failures are fatal and surface to the caller with no partial graph.
//! Unresolved edge references and orb failures are not errors: the first is
//! logged and the edge dropped, the second ends a propagation run with a
//! failure event.

use crate::core::types::NodeId;
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the blackwall network
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Graph construction failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Graph store operation errors
    #[error("Graph operation error: {0}")]
    Graph(#[from] GraphError),

    /// Propagation run errors
    #[error("Propagation error: {0}")]
    Propagation(#[from] PropagationError),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation needs a network but none is loaded
    #[error("No network loaded")]
    NotLoaded,
}

/// Errors raised while turning a payload into a graph
#[derive(Error, Debug)]
pub enum BuildError {
    /// Payload is not the expected shape at all
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A node record is missing or has a bad field
    #[error("Malformed node record at index {index}: {reason}")]
    MalformedNode {
        /// Position of the record in the node list
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// An edge record is missing or has a bad field
    #[error("Malformed edge record at index {index}: {reason}")]
    MalformedEdge {
        /// Position of the record in the edge list
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Build parameters cannot produce a graph
    #[error("Invalid build parameter: {0}")]
    InvalidParameter(String),

    /// Store rejected an insertion
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Graph store errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// Node id already present in the store
    #[error("Duplicate node id: {id}")]
    DuplicateId {
        /// The id that was inserted twice
        id: NodeId,
    },

    /// Node not found
    #[error("Node not found: {id}")]
    NodeNotFound {
        /// ID of the missing node
        id: NodeId,
    },

    /// Edge not found
    #[error("Edge not found: {id}")]
    EdgeNotFound {
        /// ID of the missing edge
        id: u32,
    },
}

/// Propagation run errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PropagationError {
    /// A think run is already in flight
    #[error("Propagation already running")]
    AlreadyRunning,

    /// The store has no central node to start from
    #[error("Graph has no central node")]
    MissingCentralNode,
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if the caller may simply try again later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Propagation(PropagationError::AlreadyRunning))
    }

    /// Check if this error was caused by bad input data
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Build(_) | Error::Json(_))
    }
}

impl BuildError {
    /// Create a malformed node error
    pub fn node(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedNode { index, reason: reason.into() }
    }

    /// Create a malformed edge error
    pub fn edge(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEdge { index, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let busy: Error = PropagationError::AlreadyRunning.into();
        assert!(busy.is_retryable());
        assert!(!busy.is_input_error());

        let bad: Error = BuildError::node(3, "missing field `layer`").into();
        assert!(bad.is_input_error());
        assert!(!bad.is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = BuildError::edge(1, "source is not an integer");
        assert_eq!(
            err.to_string(),
            "Malformed edge record at index 1: source is not an integer"
        );

        let dup = GraphError::DuplicateId { id: NodeId::Central };
        assert_eq!(dup.to_string(), "Duplicate node id: central");
    }
}
