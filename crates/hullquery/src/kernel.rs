//! Hull-construction capability and the built-in enumeration kernel.
//!
//! Purpose
//! - `HullKernel` is the seam between the adapter and whatever computes the
//!   convex hull of a point set. The adapter owns validation, normalization and
//!   verification; a kernel only has to return vertices and supporting planes.
//!
//! Built-in kernel (`EnumerationKernel`)
//! - 2-D: Andrew's monotone chain, CCW order, outward normals `(e.y, -e.x)`.
//! - D >= 3: every D-subset of points spans a candidate hyperplane (cofactor
//!   normal); keep it if all points lie on one side. Vertices are the points
//!   whose tight facet normals have rank D.
//! - Complexity O(N^(D+1)). In 3-D a few hundred points already take about a
//!   second with optimizations; the adapter prefilters above 64 points for
//!   D >= 3 (256 in 2-D). Larger inputs should go through a dedicated kernel.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::cfg::Tolerances;
use crate::options::KernelConfig;
use crate::types::Halfspace;
use crate::util::{
    affine_rank, cofactor_normal, dedup_points, extent, for_each_combination, lex_cmp,
};

/// Unvalidated kernel output. Normals need not be unit or outward.
#[derive(Clone, Debug, Default)]
pub struct RawHull {
    pub vertices: Vec<DVector<f64>>,
    pub facets: Vec<Halfspace>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum KernelError {
    /// Input does not span the full dimension.
    Degenerate { reason: String },
    /// Non-finite input or a numerical breakdown.
    Numerical { reason: String },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Degenerate { reason } => write!(f, "degenerate point set: {reason}"),
            KernelError::Numerical { reason } => write!(f, "numerical failure: {reason}"),
        }
    }
}

impl std::error::Error for KernelError {}

/// Computes the convex hull of a point set.
pub trait HullKernel {
    fn hull(&self, points: &[DVector<f64>], cfg: &KernelConfig) -> Result<RawHull, KernelError>;
}

impl<K: HullKernel + ?Sized> HullKernel for &K {
    fn hull(&self, points: &[DVector<f64>], cfg: &KernelConfig) -> Result<RawHull, KernelError> {
        (**self).hull(points, cfg)
    }
}

/// Brute-force kernel; exact enough for moderate point counts in any dimension.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumerationKernel;

impl HullKernel for EnumerationKernel {
    fn hull(&self, points: &[DVector<f64>], cfg: &KernelConfig) -> Result<RawHull, KernelError> {
        let Some(first) = points.first() else {
            return Err(KernelError::Degenerate {
                reason: "no points".into(),
            });
        };
        let dim = first.len();
        if points.iter().any(|p| p.iter().any(|x| !x.is_finite())) {
            return Err(KernelError::Numerical {
                reason: "non-finite coordinate".into(),
            });
        }
        let tol = Tolerances::scaled(cfg.tolerance, extent(points));
        let pts = dedup_points(points.to_vec(), tol.feas);
        if pts.len() < dim + 1 {
            return Err(KernelError::Degenerate {
                reason: format!("{} distinct points in {dim}-D", pts.len()),
            });
        }
        let refs: Vec<&DVector<f64>> = pts.iter().collect();
        let rank = affine_rank(&refs, tol.rank);
        if rank < dim {
            return Err(KernelError::Degenerate {
                reason: format!("points span only {rank} of {dim} dimensions"),
            });
        }
        let raw = if dim == 2 {
            monotone_chain(&pts, tol.feas * extent(&pts))
        } else {
            supporting_planes(&pts, &tol)
        };
        if raw.facets.len() < dim + 1 || raw.vertices.len() < dim + 1 {
            return Err(KernelError::Numerical {
                reason: format!(
                    "found {} facets and {} vertices for a full-dimensional set",
                    raw.facets.len(),
                    raw.vertices.len()
                ),
            });
        }
        Ok(raw)
    }
}

/// Andrew's monotone chain; collinear boundary points are dropped.
fn monotone_chain(points: &[DVector<f64>], area_eps: f64) -> RawHull {
    let mut pts: Vec<&DVector<f64>> = points.iter().collect();
    pts.sort_by(|a, b| lex_cmp(a, b));
    let cross = |a: &DVector<f64>, b: &DVector<f64>, c: &DVector<f64>| {
        (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
    };
    let mut lower: Vec<&DVector<f64>> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2
            && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= area_eps
        {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<&DVector<f64>> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2
            && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= area_eps
        {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    let ring: Vec<DVector<f64>> = lower.into_iter().chain(upper).cloned().collect();
    let mut facets = Vec::with_capacity(ring.len());
    for k in 0..ring.len() {
        let p = &ring[k];
        let q = &ring[(k + 1) % ring.len()];
        // CCW order: outward normal is the edge rotated clockwise
        let n = DVector::from_vec(vec![q[1] - p[1], p[0] - q[0]]);
        let c = n.dot(p);
        if let Some(h) = Halfspace::new(n, c).normalized() {
            facets.push(h);
        }
    }
    RawHull {
        vertices: ring,
        facets,
    }
}

fn supporting_planes(points: &[DVector<f64>], tol: &Tolerances) -> RawHull {
    let dim = points[0].len();
    let mut facets: Vec<Halfspace> = Vec::new();
    for_each_combination(points.len(), dim, |comb| {
        let sub: Vec<&DVector<f64>> = comb.iter().map(|&i| &points[i]).collect();
        let Some(n) = cofactor_normal(&sub) else {
            return;
        };
        let c = n.dot(sub[0]);
        let (mut lo, mut hi) = (0.0f64, 0.0f64);
        for p in points {
            let d = n.dot(p) - c;
            lo = lo.min(d);
            hi = hi.max(d);
            if lo < -tol.feas && hi > tol.feas {
                return;
            }
        }
        let h = if hi <= tol.feas {
            Halfspace::new(n, c)
        } else {
            Halfspace::new(-n, -c)
        };
        let dup = facets
            .iter()
            .any(|f| (&f.n - &h.n).norm() < tol.tight && (f.c - h.c).abs() < tol.tight);
        if !dup {
            facets.push(h);
        }
    });

    let mut vertices: Vec<DVector<f64>> = points
        .iter()
        .filter(|p| {
            let p: &DVector<f64> = p;
            let tight: Vec<&Halfspace> = facets
                .iter()
                .filter(|h| (h.n.dot(p) - h.c).abs() <= tol.tight)
                .collect();
            if tight.len() < dim {
                return false;
            }
            let m = DMatrix::from_fn(tight.len(), dim, |r, c| tight[r].n[c]);
            m.rank(1e-9) == dim
        })
        .cloned()
        .collect();
    vertices.sort_by(lex_cmp);
    RawHull { vertices, facets }
}
