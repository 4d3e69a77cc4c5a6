//! Canonical hulls used in tests, benchmarks and demos.
//!
//! Every constructor goes through the regular adapter (`HullBuilder`) from a
//! vertex list, so they double as construction smoke tests.
//!
//! References
//! - Coordinate-product maxima, for checks:
//!   - Hypercube [-a,a]^D: a^D at any corner with an even number of minus signs.
//!   - Corner simplex {x >= 0, Σx <= s}: (s/D)^D at (s/D, …, s/D).

use std::f64::consts::TAU;

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::build::HullBuilder;
use crate::error::HullError;
use crate::types::Hull;

fn from_vertices(points: Vec<DVector<f64>>) -> Result<Hull, HullError> {
    HullBuilder::default().build(&points)
}

/// Square with vertices `(0,0), (1,0), (1,1), (0,1)`.
pub fn unit_square() -> Result<Hull, HullError> {
    from_vertices(vec![
        DVector::from_vec(vec![0.0, 0.0]),
        DVector::from_vec(vec![1.0, 0.0]),
        DVector::from_vec(vec![1.0, 1.0]),
        DVector::from_vec(vec![0.0, 1.0]),
    ])
}

/// Axis-aligned hypercube `[-a, a]^dim`.
pub fn hypercube(dim: usize, a: f64) -> Result<Hull, HullError> {
    let corners = (0..1usize << dim)
        .map(|mask| DVector::from_fn(dim, |k, _| if (mask >> k) & 1 == 1 { a } else { -a }))
        .collect();
    from_vertices(corners)
}

/// Corner simplex `{x >= 0, Σ x_i <= scale}`.
pub fn simplex(dim: usize, scale: f64) -> Result<Hull, HullError> {
    let mut pts = vec![DVector::zeros(dim)];
    for k in 0..dim {
        let mut e = DVector::zeros(dim);
        e[k] = scale;
        pts.push(e);
    }
    from_vertices(pts)
}

/// Cross polytope `{x : ‖x‖₁ <= r}`.
pub fn cross_polytope(dim: usize, r: f64) -> Result<Hull, HullError> {
    let mut pts = Vec::with_capacity(2 * dim);
    for k in 0..dim {
        for s in [-r, r] {
            let mut e = DVector::zeros(dim);
            e[k] = s;
            pts.push(e);
        }
    }
    from_vertices(pts)
}

/// Regular `n`-gon of circumradius `r` centered at the origin, first vertex on +x.
pub fn regular_polygon(n: usize, r: f64) -> Result<Hull, HullError> {
    let pts = (0..n)
        .map(|k| {
            let t = TAU * k as f64 / n as f64;
            DVector::from_vec(vec![r * t.cos(), r * t.sin()])
        })
        .collect();
    from_vertices(pts)
}

/// `n` seeded uniform samples from `[-r, r]^dim`.
pub fn random_cloud(dim: usize, n: usize, r: f64, seed: u64) -> Vec<DVector<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| DVector::from_fn(dim, |_, _| rng.gen_range(-r..=r)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_combinatorics() {
        assert_eq!(hypercube(3, 1.0).unwrap().facets().len(), 6);
        assert_eq!(hypercube(4, 1.0).unwrap().vertices().len(), 16);
        assert_eq!(cross_polytope(3, 1.0).unwrap().facets().len(), 8);
        assert_eq!(simplex(3, 1.0).unwrap().facets().len(), 4);
        let hex = regular_polygon(6, 2.0).unwrap();
        assert_eq!(hex.vertices().len(), 6);
        assert_eq!(hex.facets().len(), 6);
    }

    #[test]
    fn random_cloud_is_reproducible() {
        let a = random_cloud(3, 10, 1.0, 5);
        let b = random_cloud(3, 10, 1.0, 5);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.amax() <= 1.0));
    }
}
