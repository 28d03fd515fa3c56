//! Cluster anchor placement
//!
//! Anchors sit on a Fibonacci sphere: index `i` gets azimuth `i * golden_angle`
//! and polar angle `acos(1 - 2 (i + 0.5) / n)`. The spiral spreads points
//! evenly without random sampling, so the same count always yields the same
//! anchors.

use crate::core::types::Position;
use cgmath::Point3;
use std::f64::consts::PI;

/// Generator of evenly spread anchor points on a sphere
#[derive(Debug, Clone, Copy)]
pub struct ClusterLayout {
    radius: f64,
}

impl ClusterLayout {
    /// Create a layout on a sphere of the given radius
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Sphere radius
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// `count` points spread over the sphere
    pub fn generate(&self, count: usize) -> Vec<Position> {
        let golden_angle = PI * (3.0 - 5f64.sqrt());
        let n = count as f64;

        (0..count)
            .map(|i| {
                let i = i as f64;
                let theta = i * golden_angle;
                let phi = (1.0 - 2.0 * (i + 0.5) / n).acos();
                spherical(self.radius, phi, theta)
            })
            .collect()
    }
}

/// Spherical to Cartesian, `phi` measured from +z
pub fn spherical(radius: f64, phi: f64, theta: f64) -> Position {
    Point3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, InnerSpace};
    use proptest::prelude::*;

    #[test]
    fn test_generate_is_deterministic() {
        let layout = ClusterLayout::new(1350.0);
        assert_eq!(layout.generate(40), layout.generate(40));
    }

    #[test]
    fn test_points_lie_on_sphere() {
        let layout = ClusterLayout::new(1350.0);
        for p in layout.generate(40) {
            assert!((p.to_vec().magnitude() - 1350.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_spiral_covers_both_poles() {
        let points = ClusterLayout::new(1.0).generate(10);
        // First point near +z, last near -z, none exactly on a pole
        assert!(points[0].z > 0.8 && points[0].z < 1.0);
        assert!(points[9].z < -0.8 && points[9].z > -1.0);
    }

    #[test]
    fn test_zero_and_one() {
        let layout = ClusterLayout::new(100.0);
        assert!(layout.generate(0).is_empty());
        let single = layout.generate(1);
        assert_eq!(single.len(), 1);
        // acos(0) puts a lone anchor on the equator
        assert!(single[0].z.abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_count_and_determinism(count in 0usize..300) {
            let layout = ClusterLayout::new(900.0);
            let first = layout.generate(count);
            prop_assert_eq!(first.len(), count);
            prop_assert_eq!(first, layout.generate(count));
        }
    }
}
