//! Infectious orb sweep
//!
//! A point that travels from the network's outer shell to a target (the origin
//! by default) over a fixed duration, with cubic in-out easing. Nodes strictly
//! closer than the infection radius to a sampled position are hits.

use crate::core::types::{NodeId, Position};
use crate::graph::store::GraphStore;
use cgmath::InnerSpace;
use std::time::Duration;

/// Cubic ease-in-out on `[0, 1]`
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t < 1.0 {
        0.5 * t * t * t
    } else {
        let t = t - 2.0;
        0.5 * (t * t * t + 2.0)
    }
}

/// One orb flight
#[derive(Debug, Clone)]
pub struct OrbSweep {
    start: Position,
    target: Position,
    started_at: Duration,
    duration: Duration,
    radius: f64,
}

impl OrbSweep {
    /// Create a sweep that starts moving at `started_at`
    pub fn new(start: Position, target: Position, started_at: Duration, duration: Duration, radius: f64) -> Self {
        Self {
            start,
            target,
            started_at,
            duration,
            radius,
        }
    }

    /// Infection radius
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Time the orb arrives at its target
    pub fn ends_at(&self) -> Duration {
        self.started_at + self.duration
    }

    /// Linear progress in `[0, 1]` at time `now`
    pub fn progress_at(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Whether the orb has arrived by `now`
    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.ends_at()
    }

    /// Eased position at time `now`
    pub fn position_at(&self, now: Duration) -> Position {
        let eased = ease_in_out_cubic(self.progress_at(now));
        self.start + (self.target - self.start) * eased
    }

    /// Nodes within the infection radius of `position`.
    ///
    /// Uses the store's grid when the radius fits within one cell, since every
    /// hit then lies in the 27-cell neighborhood. Otherwise scans all nodes.
    pub fn hits(&self, store: &GraphStore, position: Position) -> Vec<NodeId> {
        let within = |id: NodeId| {
            store
                .find_node(id)
                .map(|node| (node.position - position).magnitude() < self.radius)
                .unwrap_or(false)
        };

        match store.grid() {
            Some(grid) if self.radius <= grid.cell_size() => grid.neighbors_of(&position).filter(|&id| within(id)).collect(),
            _ => store
                .nodes()
                .filter(|node| (node.position - position).magnitude() < self.radius)
                .map(|node| node.id)
                .collect(),
        }
    }
}

/// Default orb flight for a network of `network_radius`
pub fn start_position(network_radius: f64, start_factor: f64) -> Position {
    Position::new(0.0, 0.0, network_radius * start_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::StateToken;
    use crate::graph::grid::SpatialGrid;
    use cgmath::EuclideanSpace;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn origin() -> Position {
        Position::origin()
    }

    #[test]
    fn test_easing_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
        assert!(ease_in_out_cubic(0.25) < 0.25);
        assert!(ease_in_out_cubic(0.75) > 0.75);
        assert_eq!(ease_in_out_cubic(2.0), 1.0);
    }

    #[test]
    fn test_position_follows_eased_path() {
        let orb = OrbSweep::new(start_position(1500.0, 1.8), origin(), ms(1000), ms(8000), 80.0);
        assert_eq!(orb.position_at(ms(0)), Position::new(0.0, 0.0, 2700.0));
        assert_eq!(orb.position_at(ms(1000)), Position::new(0.0, 0.0, 2700.0));
        assert!((orb.position_at(ms(5000)).z - 1350.0).abs() < 1e-9);
        assert_eq!(orb.position_at(ms(9000)), origin());
        assert_eq!(orb.position_at(ms(20_000)), origin());
        assert!(orb.is_finished(ms(9000)));
        assert!(!orb.is_finished(ms(8999)));
    }

    fn store_with_grid(positions: &[(u32, Position)]) -> GraphStore {
        let mut store = GraphStore::new();
        let mut grid = SpatialGrid::new(300.0);
        store.add_node(NodeId::Central, 0, origin(), StateToken::Central).unwrap();
        grid.insert(NodeId::Central, &origin());
        for &(i, pos) in positions {
            store.add_node(NodeId::Index(i), 0, pos, StateToken::Palette(0)).unwrap();
            grid.insert(NodeId::Index(i), &pos);
        }
        store.set_grid(grid);
        store
    }

    #[test]
    fn test_hits_use_strict_radius() {
        let store = store_with_grid(&[
            (0, Position::new(79.0, 0.0, 0.0)),
            (1, Position::new(80.0, 0.0, 0.0)),
            (2, Position::new(0.0, 310.0, 0.0)),
        ]);
        let orb = OrbSweep::new(origin(), origin(), ms(0), ms(10), 80.0);
        let mut hits = orb.hits(&store, origin());
        hits.sort();
        assert_eq!(hits, vec![NodeId::Central, NodeId::Index(0)]);
    }

    #[test]
    fn test_grid_and_scan_agree() {
        let positions: Vec<(u32, Position)> = (0..200)
            .map(|i| {
                let f = i as f64;
                (i, Position::new((f * 37.0) % 900.0 - 450.0, (f * 53.0) % 700.0 - 350.0, (f * 11.0) % 500.0 - 250.0))
            })
            .collect();
        let store = store_with_grid(&positions);
        let probe = Position::new(20.0, -40.0, 10.0);

        let orb = OrbSweep::new(origin(), origin(), ms(0), ms(10), 150.0);
        let mut by_grid = orb.hits(&store, probe);

        let mut plain = GraphStore::new();
        for node in store.nodes() {
            plain.add_node(node.id, node.layer, node.position, node.base_state()).unwrap();
        }
        let mut scanned = orb.hits(&plain, probe);

        by_grid.sort();
        scanned.sort();
        assert!(!by_grid.is_empty());
        assert_eq!(by_grid, scanned);
    }
}
