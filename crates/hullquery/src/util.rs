//! Small utilities: combinations, geometric dedup, affine frames and
//! cofactor normals on dynamic nalgebra types.

use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector};

/// Visit every k-combination of `0..n` in lexicographic order.
pub(crate) fn for_each_combination<F: FnMut(&[usize])>(n: usize, k: usize, mut f: F) {
    if k > n || k == 0 {
        return;
    }
    let mut idxs: Vec<usize> = (0..k).collect();
    loop {
        f(&idxs);
        // rightmost slot that can still advance
        let mut i = k;
        while i > 0 && idxs[i - 1] == i - 1 + n - k {
            i -= 1;
        }
        if i == 0 {
            return;
        }
        idxs[i - 1] += 1;
        for j in i..k {
            idxs[j] = idxs[j - 1] + 1;
        }
    }
}

/// Lexicographic comparison of two equally sized points.
pub(crate) fn lex_cmp(a: &DVector<f64>, b: &DVector<f64>) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            o => return o,
        }
    }
    Ordering::Equal
}

/// Drop points within `tol` of an earlier kept point. Keeps first occurrences.
pub(crate) fn dedup_points(points: Vec<DVector<f64>>, tol: f64) -> Vec<DVector<f64>> {
    let mut out: Vec<DVector<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if out.iter().all(|q| (q - &p).norm() >= tol) {
            out.push(p);
        }
    }
    out
}

pub(crate) fn centroid<'a, I>(points: I, dim: usize) -> DVector<f64>
where
    I: IntoIterator<Item = &'a DVector<f64>>,
{
    let mut acc = DVector::zeros(dim);
    let mut count = 0usize;
    for p in points {
        acc += p;
        count += 1;
    }
    if count > 0 {
        acc /= count as f64;
    }
    acc
}

/// Diagonal of the axis-aligned bounding box; used to scale tolerances.
pub(crate) fn extent(points: &[DVector<f64>]) -> f64 {
    let Some(first) = points.first() else {
        return 0.0;
    };
    let mut lo = first.clone();
    let mut hi = first.clone();
    for p in &points[1..] {
        lo = lo.inf(p);
        hi = hi.sup(p);
    }
    (hi - lo).norm()
}

/// Affine hull of a point set: an origin plus orthonormal direction columns.
#[derive(Clone, Debug)]
pub(crate) struct AffineFrame {
    pub origin: DVector<f64>,
    /// `dim x k`, orthonormal columns; `k` is the affine dimension.
    pub basis: DMatrix<f64>,
}

impl AffineFrame {
    #[inline]
    pub fn dim(&self) -> usize {
        self.basis.ncols()
    }

    /// Orthogonal projection of `p` onto the affine hull.
    pub fn project(&self, p: &DVector<f64>) -> DVector<f64> {
        let rel = p - &self.origin;
        let coords = self.basis.transpose() * rel;
        &self.origin + &self.basis * coords
    }

    /// Distance from `p` to the affine hull.
    #[inline]
    pub fn residual(&self, p: &DVector<f64>) -> f64 {
        (self.project(p) - p).norm()
    }
}

/// Affine frame of `points`: pivoted modified Gram-Schmidt on `p - origin`.
///
/// Each step takes the point with the largest residual off the current span
/// and stops once every residual is at most `tol`, so every input point lies
/// within `tol` of the frame.
pub(crate) fn affine_frame(points: &[&DVector<f64>], tol: f64) -> AffineFrame {
    let dim = points.first().map(|p| p.len()).unwrap_or(0);
    let origin = centroid(points.iter().copied(), dim);
    let mut residuals: Vec<DVector<f64>> = points.iter().map(|p| *p - &origin).collect();
    let mut columns: Vec<DVector<f64>> = Vec::with_capacity(dim);
    while columns.len() < dim {
        let Some((pivot, norm)) = residuals
            .iter()
            .map(|r| r.norm())
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        else {
            break;
        };
        if !(norm.is_finite() && norm > tol) {
            break;
        }
        let mut q = residuals[pivot].clone();
        // second pass against the accepted columns
        for e in &columns {
            let a = e.dot(&q);
            q.axpy(-a, e, 1.0);
        }
        let qn = q.norm();
        if !(qn.is_finite() && qn > tol) {
            break;
        }
        q /= qn;
        for r in residuals.iter_mut() {
            let a = q.dot(r);
            r.axpy(-a, &q, 1.0);
        }
        columns.push(q);
    }
    let basis = if columns.is_empty() {
        DMatrix::zeros(dim, 0)
    } else {
        DMatrix::from_columns(&columns)
    };
    AffineFrame { origin, basis }
}

/// Affine dimension of a point set (`-1` is not representable; empty -> 0).
#[inline]
pub(crate) fn affine_rank(points: &[&DVector<f64>], tol: f64) -> usize {
    affine_frame(points, tol).dim()
}

/// Normal of the hyperplane through `dim` points in R^dim via cofactors.
///
/// Rows are `p_i - p_0`; component `j` is the signed minor that drops column
/// `j`. Returns `None` if the points do not span a hyperplane.
pub(crate) fn cofactor_normal(pts: &[&DVector<f64>]) -> Option<DVector<f64>> {
    let dim = pts.first()?.len();
    if pts.len() != dim || dim < 2 {
        return None;
    }
    let rows = DMatrix::from_fn(dim - 1, dim, |r, c| pts[r + 1][c] - pts[0][c]);
    let scale: f64 = (0..dim - 1).map(|r| rows.row(r).norm()).product();
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let n = DVector::from_fn(dim, |j, _| {
        let minor = rows.clone().remove_column(j).determinant();
        if j % 2 == 0 {
            minor
        } else {
            -minor
        }
    });
    let norm = n.norm();
    if !norm.is_finite() || norm <= crate::cfg::DET_EPS * scale {
        return None;
    }
    Some(n / norm)
}
