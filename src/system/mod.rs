//! System utilities and monitoring
//!
//! This module contains metrics collection for builds and propagation runs.

pub mod metrics;
