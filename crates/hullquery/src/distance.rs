//! Membership and signed distance.
//!
//! Conventions
//! - Boundary points (within the feasibility tolerance) are inside.
//! - `interior_distance` is the slack to the nearest facet hyperplane; it is
//!   negative for exterior points and only its sign is meaningful there.
//! - `boundary_distance` is the Euclidean distance to the boundary surface.
//!   Exterior points descend the face lattice through violated bounds only:
//!   the nearest point of a polytope to an outside point lies on a facet whose
//!   inequality that point violates, and the same holds within every face.
//! - Query points must have the hull's dimension; anything else panics.

use std::collections::HashMap;

use nalgebra::DVector;

use crate::faces::FaceId;
use crate::grid::Grid;
use crate::options::Resolution;
use crate::types::Hull;

/// Result of the grid cross-check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceEstimate {
    pub distance: f64,
    /// Largest lattice spacing; the estimate is within about twice this.
    pub grid_step: f64,
}

impl Hull {
    #[inline]
    fn check_dim(&self, p: &DVector<f64>) {
        assert_eq!(
            p.len(),
            self.dim(),
            "query point dimension does not match the hull"
        );
    }

    /// True iff `p` satisfies every facet within tolerance.
    ///
    /// Points more than the tightness tolerance outside the bounding box are
    /// rejected before the facet scan.
    pub fn is_inside(&self, p: &DVector<f64>) -> bool {
        self.check_dim(p);
        let tol = self.tolerances();
        let (lo, hi) = self.bounds();
        let boxed = p
            .iter()
            .zip(lo.iter().zip(hi.iter()))
            .all(|(x, (l, h))| *x >= l - tol.tight && *x <= h + tol.tight);
        boxed && self.facets().iter().all(|h| h.satisfies_eps(p, tol.feas))
    }

    /// Distance to the nearest facet hyperplane, `min_i (c_i - n_i·p)`.
    pub fn interior_distance(&self, p: &DVector<f64>) -> f64 {
        self.check_dim(p);
        self.facets()
            .iter()
            .map(|h| h.slack(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Euclidean distance from `p` to the boundary, inside or out.
    pub fn boundary_distance(&self, p: &DVector<f64>) -> f64 {
        if self.is_inside(p) {
            return self.interior_distance(p).max(0.0);
        }
        (self.nearest_boundary_point(p) - p).norm()
    }

    /// Negative depth inside, positive distance outside.
    pub fn signed_distance(&self, p: &DVector<f64>) -> f64 {
        if self.is_inside(p) {
            -self.interior_distance(p).max(0.0)
        } else {
            self.boundary_distance(p)
        }
    }

    /// Boundary point realizing `boundary_distance(p)`.
    pub fn nearest_boundary_point(&self, p: &DVector<f64>) -> DVector<f64> {
        self.check_dim(p);
        let eps = self.tolerances().feas;
        if self.is_inside(p) {
            // the projection onto the closest facet plane lies on that facet
            let mut best = (f64::INFINITY, 0usize);
            for (i, h) in self.facets().iter().enumerate() {
                let s = h.slack(p);
                if s < best.0 {
                    best = (s, i);
                }
            }
            let h = &self.facets()[best.1];
            return p + &h.n * best.0.max(0.0);
        }
        let mut memo: HashMap<FaceId, DVector<f64>> = HashMap::new();
        let mut best: Option<(f64, DVector<f64>)> = None;
        for (i, h) in self.facets().iter().enumerate() {
            if h.slack(p) >= -eps {
                continue;
            }
            let q = self.nearest_on_face(self.lattice().facet(i), p, &mut memo);
            let d = (&q - p).norm();
            if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                best = Some((d, q));
            }
        }
        match best {
            Some((_, q)) => q,
            None => p.clone(),
        }
    }

    fn nearest_on_face(
        &self,
        id: FaceId,
        p: &DVector<f64>,
        memo: &mut HashMap<FaceId, DVector<f64>>,
    ) -> DVector<f64> {
        if let Some(q) = memo.get(&id) {
            return q.clone();
        }
        let face = self.lattice().face(id);
        let q = if face.dim == 0 {
            self.vertices()[face.vertices[0]].clone()
        } else {
            let proj = face.frame.project(p);
            let eps = self.tolerances().feas;
            let mut best: Option<(f64, DVector<f64>)> = None;
            for (ridge, bound) in face.ridges.iter().zip(&face.bounds) {
                if bound.slack(&proj) >= -eps {
                    continue;
                }
                let cand = self.nearest_on_face(*ridge, p, memo);
                let d = (&cand - p).norm();
                if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                    best = Some((d, cand));
                }
            }
            best.map(|(_, c)| c).unwrap_or(proj)
        };
        memo.insert(id, q.clone());
        q
    }

    /// Grid cross-check of `boundary_distance`.
    ///
    /// Samples the bounding box (padded by one step) and returns the distance
    /// to the closest lattice point on the other side of the boundary. For an
    /// exterior `p` the vertices also count as inside samples. The result never
    /// undershoots the exact distance.
    pub fn estimate_boundary_distance(
        &self,
        p: &DVector<f64>,
        resolution: Resolution,
    ) -> DistanceEstimate {
        let inside = self.is_inside(p);
        let (lo, hi) = self.bounds();
        let grid = Grid::covering(lo, hi, resolution, 1);
        let mut best = f64::INFINITY;
        grid.for_each(|g| {
            if self.is_inside(g) != inside {
                best = best.min((g - p).norm());
            }
        });
        if !inside {
            for v in self.vertices() {
                best = best.min((v - p).norm());
            }
        }
        DistanceEstimate {
            distance: best,
            grid_step: grid.max_step(),
        }
    }
}
