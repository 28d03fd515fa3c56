//! Graph data structures and construction
//!
//! This module contains the node and edge types, the identity-indexed store,
//! the spatial grid, cluster layout, payload parsing and the network builder.

pub mod builder;
pub mod edge;
pub mod grid;
pub mod layout;
pub mod node;
pub mod payload;
pub mod store;

// Re-export main graph types
pub use builder::GraphBuilder;
pub use edge::Edge;
pub use grid::{CellKey, SpatialGrid};
pub use layout::ClusterLayout;
pub use node::Node;
pub use payload::{Activation, EdgeRecord, NetworkPayload, NodeRecord, ThinkPayload, Wave};
pub use store::{GraphStats, GraphStore, RestoredEntities};
