//! Neural Blackwall - graph construction and infection propagation engine
//!
//! Builds a clustered 3D network around a central node from a JSON payload,
//! densifies it with proximity edges found through a spatial grid, and runs
//! the scripted infection sequences over it: an immediate breadth-first
//! infection and a timed think cycle driven by an infectious orb. Rendering
//! is left to a consumer of the emitted [`RenderEvent`]s.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod graph;
pub mod propagation;
pub mod session;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{Config, Error, NodeId, Result};
pub use graph::{GraphBuilder, GraphStore};
pub use propagation::{PropagationEngine, RenderEvent, ThinkPhase};
pub use session::{NetworkSession, SessionStatus};

use crate::core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing and the metrics registry.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let installed = match logging.format.as_str() {
        "json" => tracing_subscriber::fmt().json().with_env_filter(filter).try_init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
    installed.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    system::metrics::init_registry();

    Ok(())
}
