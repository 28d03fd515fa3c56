//! Metrics collection for network builds and propagation runs
//!
//! Counters live in a private Prometheus registry so the binary can dump them
//! on exit. Recording never fails: if registration is refused the recorders
//! become no-ops and a warning is logged once.

use crate::graph::store::GraphStats;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Histogram, IntCounter,
    IntCounterVec, IntGauge, Registry,
};
use std::time::Instant;
use tracing::warn;

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Counters for network construction
pub struct BuildMetrics {
    /// Networks built
    pub networks_built: IntCounter,
    /// Nodes inserted, central node included
    pub nodes_built: IntCounter,
    /// Edges inserted, by kind
    pub edges_built: IntCounterVec,
    /// Edge records dropped for unknown endpoints
    pub dropped_references: IntCounter,
    /// Build duration in seconds
    pub build_duration: Histogram,
}

/// Counters for traversal and think cycles
pub struct PropagationMetrics {
    /// Nodes newly infected, by mode
    pub infections: IntCounterVec,
    /// Finished think cycles, by outcome
    pub think_runs: IntCounterVec,
    /// Resets performed
    pub resets: IntCounter,
    /// Timers waiting in the scheduler
    pub pending_timers: IntGauge,
}

/// All metrics of the crate
pub struct Metrics {
    /// Construction metrics
    pub build: BuildMetrics,
    /// Propagation metrics
    pub propagation: PropagationMetrics,
}

impl Metrics {
    /// Create and register all metrics
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            build: BuildMetrics::new()?,
            propagation: PropagationMetrics::new()?,
        })
    }

    /// Get the global metrics instance, if registration succeeded
    pub fn global() -> Option<&'static Metrics> {
        static INSTANCE: Lazy<Option<Metrics>> = Lazy::new(|| match Metrics::new() {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!("Metrics disabled: {}", e);
                None
            }
        });
        INSTANCE.as_ref()
    }
}

impl BuildMetrics {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            networks_built: register_int_counter_with_registry!(
                "nb_networks_built_total",
                "Total number of networks built",
                REGISTRY
            )?,
            nodes_built: register_int_counter_with_registry!(
                "nb_nodes_built_total",
                "Total number of nodes inserted",
                REGISTRY
            )?,
            edges_built: register_int_counter_vec_with_registry!(
                "nb_edges_built_total",
                "Total number of edges inserted by kind",
                &["kind"],
                REGISTRY
            )?,
            dropped_references: register_int_counter_with_registry!(
                "nb_dropped_references_total",
                "Edge records dropped for unresolved endpoints",
                REGISTRY
            )?,
            build_duration: register_histogram_with_registry!(
                "nb_build_duration_seconds",
                "Duration of network builds in seconds",
                vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
                REGISTRY
            )?,
        })
    }
}

impl PropagationMetrics {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            infections: register_int_counter_vec_with_registry!(
                "nb_infections_total",
                "Nodes newly infected by mode",
                &["mode"],
                REGISTRY
            )?,
            think_runs: register_int_counter_vec_with_registry!(
                "nb_think_runs_total",
                "Finished think cycles by outcome",
                &["outcome"],
                REGISTRY
            )?,
            resets: register_int_counter_with_registry!(
                "nb_resets_total",
                "Total number of resets",
                REGISTRY
            )?,
            pending_timers: register_int_gauge_with_registry!(
                "nb_pending_timers",
                "Timers waiting in the propagation scheduler",
                REGISTRY
            )?,
        })
    }
}

/// Timer for measuring an operation and recording it into a histogram
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing a network build
pub fn build_timer() -> Option<Timer> {
    Metrics::global().map(|m| Timer::start(m.build.build_duration.clone()))
}

/// Record the outcome of a network build
pub fn record_build(stats: &GraphStats) {
    let Some(metrics) = Metrics::global() else { return };
    let build = &metrics.build;
    build.networks_built.inc();
    build.nodes_built.inc_by(stats.nodes as u64);
    build.edges_built.with_label_values(&["data"]).inc_by(stats.data_edges as u64);
    build.edges_built.with_label_values(&["central_spoke"]).inc_by(stats.spoke_edges as u64);
    build.edges_built.with_label_values(&["synthetic"]).inc_by(stats.synthetic_edges as u64);
    build.dropped_references.inc_by(stats.dropped_references as u64);
}

/// Record newly infected nodes for a traversal mode
pub fn record_infections(mode: &str, count: usize) {
    if let Some(metrics) = Metrics::global() {
        metrics.propagation.infections.with_label_values(&[mode]).inc_by(count as u64);
    }
}

/// Record a finished think cycle
pub fn record_think_outcome(outcome: &str) {
    if let Some(metrics) = Metrics::global() {
        metrics.propagation.think_runs.with_label_values(&[outcome]).inc();
    }
}

/// Record a reset
pub fn record_reset() {
    if let Some(metrics) = Metrics::global() {
        metrics.propagation.resets.inc();
    }
}

/// Publish the scheduler queue length
pub fn set_pending_timers(count: usize) {
    if let Some(metrics) = Metrics::global() {
        metrics.propagation.pending_timers.set(count as i64);
    }
}

/// Register all metrics up front
pub fn init_registry() {
    let _ = Metrics::global();
}

/// Registry holding the crate's metrics
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Gather all metrics in the Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_build_updates_counters() {
        init_registry();
        let stats = GraphStats {
            nodes: 4,
            edges: 5,
            data_edges: 2,
            spoke_edges: 3,
            ..GraphStats::default()
        };
        let before = Metrics::global().unwrap().build.nodes_built.get();
        record_build(&stats);
        assert!(Metrics::global().unwrap().build.nodes_built.get() >= before + 4);

        let text = collect_metrics();
        assert!(text.contains("nb_edges_built_total"));
        assert!(text.contains("central_spoke"));
    }

    #[test]
    fn test_timer_observes_histogram() {
        let timer = build_timer().unwrap();
        timer.finish();
        assert!(Metrics::global().unwrap().build.build_duration.get_sample_count() >= 1);
    }
}
