//! Infection propagation
//!
//! Breadth-first full infection, the timed think cycle with its orb sweep,
//! the virtual-time scheduler both run on, and the events handed to the
//! render layer.

pub mod engine;
pub mod events;
pub mod orb;
pub mod scheduler;

pub use engine::{PropagationEngine, RunReport, ThinkPhase};
pub use events::RenderEvent;
pub use orb::OrbSweep;
pub use scheduler::{Scheduler, TimerId};
