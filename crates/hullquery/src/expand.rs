//! Outward offset of a hull by a margin.
//!
//! Exact mode
//! - Translate every facet plane by `margin` along its unit normal and
//!   recompute vertices by enumerating D-subsets of the translated planes
//!   (solve, then keep feasible intersections). Corners stay sharp.
//!
//! Approximate mode
//! - Move every vertex `margin` further from the centroid:
//!   `v' = c + (v - c) · (1 + margin / |v - c|)`, then rebuild the hull.
//!   Each old vertex is a convex combination of `c` and its pushed copy, and
//!   `c` is inside the new hull, so the old hull is contained in the new one.

use nalgebra::{DMatrix, DVector};

use crate::build::HullBuilder;
use crate::cfg::DET_EPS;
use crate::error::HullError;
use crate::kernel::HullKernel;
use crate::options::ExpansionMode;
use crate::types::{Halfspace, Hull};
use crate::util::{dedup_points, for_each_combination};

/// Expand with the built-in kernel.
pub fn expand(hull: &Hull, margin: f64, mode: ExpansionMode) -> Result<Hull, HullError> {
    expand_with(hull, margin, mode, &HullBuilder::default())
}

/// Expand; approximate mode rebuilds through `builder`.
pub fn expand_with<K: HullKernel>(
    hull: &Hull,
    margin: f64,
    mode: ExpansionMode,
    builder: &HullBuilder<K>,
) -> Result<Hull, HullError> {
    if !(margin.is_finite() && margin >= 0.0) {
        return Err(HullError::invalid(
            "margin",
            margin.to_string(),
            "margin must be finite and non-negative",
        ));
    }
    if margin == 0.0 {
        return Ok(hull.clone());
    }
    match mode {
        ExpansionMode::Exact => expand_exact(hull, margin),
        ExpansionMode::Approximate => expand_approx(hull, margin, builder),
    }
}

fn expand_exact(hull: &Hull, margin: f64) -> Result<Hull, HullError> {
    let dim = hull.dim();
    let facets: Vec<Halfspace> = hull
        .facets()
        .iter()
        .map(|h| Halfspace::new(h.n.clone(), h.c + margin))
        .collect();
    let vertices = h_to_vertices(&facets, dim, hull.tolerances().feas);
    Hull::from_parts(dim, vertices, facets, *hull.tolerances())
}

/// Vertices of `{x : n_i·x <= c_i}` by enumerating D-subsets of planes.
pub(crate) fn h_to_vertices(hs: &[Halfspace], dim: usize, eps: f64) -> Vec<DVector<f64>> {
    let mut out = Vec::new();
    for_each_combination(hs.len(), dim, |comb| {
        let a = DMatrix::from_fn(dim, dim, |r, c| hs[comb[r]].n[c]);
        if a.determinant().abs() <= DET_EPS {
            return;
        }
        let b = DVector::from_fn(dim, |r, _| hs[comb[r]].c);
        let Some(x) = a.lu().solve(&b) else {
            return;
        };
        if hs.iter().all(|h| h.satisfies_eps(&x, eps)) {
            out.push(x);
        }
    });
    dedup_points(out, eps)
}

fn expand_approx<K: HullKernel>(
    hull: &Hull,
    margin: f64,
    builder: &HullBuilder<K>,
) -> Result<Hull, HullError> {
    let c = hull.centroid();
    let pushed: Vec<DVector<f64>> = hull
        .vertices()
        .iter()
        .map(|v| {
            let r = (v - c).norm();
            if r > 0.0 {
                c + (v - c) * (1.0 + margin / r)
            } else {
                v.clone()
            }
        })
        .collect();
    builder.build(&pushed)
}

impl Hull {
    /// Shorthand for [`expand`].
    pub fn expand(&self, margin: f64, mode: ExpansionMode) -> Result<Hull, HullError> {
        expand(self, margin, mode)
    }
}
