//! Core system types and foundations
//!
//! This module contains the fundamental building blocks of the blackwall
//! network: identifiers and visual tokens, error handling and configuration.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::Config;
pub use error::{BuildError, Error, GraphError, PropagationError, Result};
pub use types::{EdgeId, EdgeKind, NodeId, Position, StateToken};
