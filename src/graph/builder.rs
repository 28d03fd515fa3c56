//! Network construction from payload records
//!
//! Build order matters: every node gets its final position and is bucketed in
//! the grid before the synthetic pass looks for neighbors.
//!
//! 1. Central node at the origin.
//! 2. One node per record, placed in a shell around its cluster anchor.
//! 3. Data edges from the payload (unknown endpoints are dropped).
//! 4. One central spoke per generated node.
//! 5. Synthetic edges between grid neighbors with a fixed probability.

use crate::core::config::{BuildConfig, ClusterPolicy, Config, LayoutConfig};
use crate::core::error::BuildError;
use crate::core::types::{EdgeKind, NodeId, Position, StateToken};
use crate::graph::grid::SpatialGrid;
use crate::graph::layout::{spherical, ClusterLayout};
use crate::graph::payload::{EdgeRecord, NetworkPayload, NodeRecord};
use crate::graph::store::GraphStore;
use crate::system::metrics;
use cgmath::{EuclideanSpace, Point3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use tracing::{debug, info};

/// Builds a [`GraphStore`] from payload records
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    layout: LayoutConfig,
    build: BuildConfig,
}

impl GraphBuilder {
    /// Create a builder from layout and build settings
    pub fn new(layout: LayoutConfig, build: BuildConfig) -> Self {
        Self { layout, build }
    }

    /// Create a builder from the full configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.layout.clone(), config.build.clone())
    }

    /// Override the synthetic edge probability
    pub fn with_synthetic_probability(mut self, probability: f64) -> Self {
        self.build.synthetic_edge_probability = probability;
        self
    }

    /// RNG for a build: seeded when the config pins a seed
    pub fn rng(&self) -> StdRng {
        match self.build.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Build from a validated payload
    pub fn build_payload(&self, payload: &NetworkPayload) -> Result<GraphStore, BuildError> {
        self.build(&payload.nodes, &payload.edges)
    }

    /// Build with the builder's own RNG
    pub fn build(&self, nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Result<GraphStore, BuildError> {
        let mut rng = self.rng();
        self.build_with_rng(nodes, edges, &mut rng)
    }

    /// Build with a caller-supplied RNG
    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        nodes: &[NodeRecord],
        edges: &[EdgeRecord],
        rng: &mut R,
    ) -> Result<GraphStore, BuildError> {
        self.check_parameters(nodes.len())?;
        let timer = metrics::build_timer();

        let mut store = GraphStore::new();
        let mut grid = SpatialGrid::new(self.layout.cell_size);

        let origin = Point3::origin();
        store.add_node(NodeId::Central, 0, origin, StateToken::Central)?;
        grid.insert(NodeId::Central, &origin);

        let anchors = ClusterLayout::new(self.layout.network_radius * self.layout.cluster_radius_factor)
            .generate(self.layout.cluster_count);

        for (index, record) in nodes.iter().enumerate() {
            let id = NodeId::Index(index as u32);
            let anchor = anchors[self.pick_cluster(record.layer, rng)];
            let position = self.scatter_around(anchor, rng);
            let token = StateToken::Palette(rng.random_range(0..self.layout.palette_size));

            store.add_node(id, record.layer, position, token)?;
            grid.insert(id, &position);
        }

        for record in edges {
            match (record.source, record.target) {
                (Some(source), Some(target)) => {
                    store.add_edge(NodeId::Index(source), NodeId::Index(target), EdgeKind::Data);
                }
                _ => store.drop_unresolved(EdgeKind::Data),
            }
        }

        for index in 0..nodes.len() {
            store.add_edge(NodeId::Central, NodeId::Index(index as u32), EdgeKind::CentralSpoke);
        }

        let synthetic = self.connect_neighbors(&mut store, &grid, rng);
        store.set_grid(grid);

        let stats = store.stats();
        if let Some(timer) = timer {
            timer.finish();
        }
        metrics::record_build(&stats);
        debug!(
            data = stats.data_edges,
            spokes = stats.spoke_edges,
            synthetic,
            dropped = stats.dropped_references,
            cells = stats.grid_cells,
            "Edge passes finished"
        );
        info!("Network built with {} nodes and {} edges", stats.nodes, stats.edges);

        Ok(store)
    }

    fn check_parameters(&self, node_count: usize) -> Result<(), BuildError> {
        if u32::try_from(node_count).is_err() {
            return Err(BuildError::InvalidParameter(format!("too many nodes: {}", node_count)));
        }
        if self.layout.cluster_count == 0 {
            return Err(BuildError::InvalidParameter("cluster count must be at least 1".into()));
        }
        if self.layout.palette_size == 0 {
            return Err(BuildError::InvalidParameter("palette must have at least one token".into()));
        }
        if self.layout.cell_size.is_nan() || self.layout.cell_size <= 0.0 {
            return Err(BuildError::InvalidParameter("cell size must be positive".into()));
        }
        let factors = [
            self.layout.network_radius,
            self.layout.cluster_radius_factor,
            self.layout.inner_factor,
            self.layout.outer_factor,
        ];
        if factors.iter().any(|f| !f.is_finite()) {
            return Err(BuildError::InvalidParameter("layout radii and factors must be finite".into()));
        }
        if self.layout.inner_factor < 0.0 || self.layout.outer_factor < self.layout.inner_factor {
            return Err(BuildError::InvalidParameter("offset shell is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.build.synthetic_edge_probability) {
            return Err(BuildError::InvalidParameter(format!(
                "synthetic edge probability out of range: {}",
                self.build.synthetic_edge_probability
            )));
        }
        Ok(())
    }

    fn pick_cluster<R: Rng + ?Sized>(&self, layer: i64, rng: &mut R) -> usize {
        let count = self.layout.cluster_count;
        match self.layout.cluster_policy {
            ClusterPolicy::ByLayer => layer.rem_euclid(count as i64) as usize,
            ClusterPolicy::Random => rng.random_range(0..count),
        }
    }

    /// Uniform direction, distance drawn from the configured shell
    fn scatter_around<R: Rng + ?Sized>(&self, anchor: Position, rng: &mut R) -> Position {
        let radius = self.layout.network_radius;
        let inner = self.layout.inner_factor;
        let span = self.layout.outer_factor - inner;

        let distance = radius * inner + rng.random::<f64>() * radius * span;
        let theta = rng.random::<f64>() * PI * 2.0;
        let phi = (2.0 * rng.random::<f64>() - 1.0).acos();

        anchor + spherical(distance, phi, theta).to_vec()
    }

    /// Synthetic pass; returns the number of edges added
    fn connect_neighbors<R: Rng + ?Sized>(&self, store: &mut GraphStore, grid: &SpatialGrid, rng: &mut R) -> usize {
        let probability = self.build.synthetic_edge_probability;
        if probability <= 0.0 {
            return 0;
        }

        let sources: Vec<(NodeId, Position)> = store.nodes().map(|n| (n.id, n.position)).collect();
        let mut added = 0;
        for (source, position) in sources {
            for candidate in grid.neighbors_of(&position) {
                if candidate == source || !rng.random_bool(probability) {
                    continue;
                }
                if store.add_edge(source, candidate, EdgeKind::Synthetic).is_some() {
                    added += 1;
                }
            }
        }
        added
    }
}
