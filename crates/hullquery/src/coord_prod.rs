//! Maximum of the coordinate product `∏ x_i` over a hull.
//!
//! Exact search
//! - A maximizer with non-zero product lies in the relative interior of some
//!   face and is stationary for the product restricted to that face's affine
//!   hull. Candidates per face dimension:
//!   - facets: Lagrange condition on a monomial gives `x_i = c / (D n_i)`;
//!   - edges: roots of the derivative of the degree-D polynomial `f(a + t(b-a))`;
//!   - faces of dimension 2..D-2: Newton on `Σ log|x_i|` in the face frame;
//!   - vertices.
//! - A zero maximum needs no extra candidate: a full-dimensional hull that
//!   crosses a coordinate hyperplane also holds points of positive product,
//!   and one that only touches it does so in a face with a vertex there.
//!
//! Estimated search
//! - Walk a grid over the first D-1 coordinates of the bounding box. Each grid
//!   column meets the hull in an interval of the last coordinate, solved
//!   exactly against all facets; the product is linear in that coordinate, so
//!   one interval end is the column's best. Columns that miss the hull are
//!   skipped; if all miss, the best vertex is returned.
//! - Observed error for 3-D hulls: `|exact - estimate| <= 3 / resolution` for
//!   hulls of unit scale. Other dimensions need their own constant.

use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::error::HullError;
use crate::grid::Grid;
use crate::options::Resolution;
use crate::types::{Halfspace, Hull};
use crate::util::AffineFrame;

/// Empirical constant `C` in `|exact - estimate| <= C / resolution` for 3-D.
pub const EMPIRICAL_ERROR_CONSTANT_3D: f64 = 3.0;

const NEWTON_MAX_ITERS: usize = 60;
const ROOT_BISECTIONS: usize = 80;

#[derive(Clone, Debug, PartialEq)]
pub struct CoordProduct {
    pub point: DVector<f64>,
    pub value: f64,
}

#[derive(Default)]
struct Best(Option<CoordProduct>);

impl Best {
    fn offer(&mut self, point: DVector<f64>) {
        let value: f64 = point.iter().product();
        if !value.is_finite() {
            return;
        }
        match &self.0 {
            Some(b) if b.value >= value => {}
            _ => self.0 = Some(CoordProduct { point, value }),
        }
    }

    fn into_result(self) -> Result<CoordProduct, HullError> {
        self.0
            .ok_or_else(|| HullError::degenerate("hull produced no candidate points"))
    }
}

fn check_structure(hull: &Hull) -> Result<(), HullError> {
    let dim = hull.dim();
    if dim < 2 || hull.facets().len() < dim + 1 || hull.vertices().len() < dim + 1 {
        return Err(HullError::degenerate(
            "coordinate-product search needs a full-dimensional hull",
        ));
    }
    Ok(())
}

/// Exact maximizer of `∏ x_i` over the hull.
pub fn max_coord_product(hull: &Hull) -> Result<CoordProduct, HullError> {
    check_structure(hull)?;
    let dim = hull.dim();
    let verts = hull.vertices();
    let mut best = Best::default();
    for v in verts {
        best.offer(v.clone());
    }
    for h in hull.facets() {
        if let Some(x) = facet_stationary(h) {
            if hull.is_inside(&x) {
                best.offer(x);
            }
        }
    }
    let edges: Vec<(&DVector<f64>, &DVector<f64>)> = hull
        .lattice()
        .faces_of_dim(1)
        .filter(|(_, f)| f.vertices.len() == 2)
        .map(|(_, f)| (&verts[f.vertices[0]], &verts[f.vertices[1]]))
        .collect();
    for &(a, b) in &edges {
        for t in edge_stationary(a, b) {
            best.offer(a + (b - a) * t);
        }
    }
    for k in 2..dim.saturating_sub(1) {
        for (_, face) in hull.lattice().faces_of_dim(k) {
            let starts = std::iter::once(face.frame.origin.clone()).chain(
                face.vertices
                    .iter()
                    .map(|&i| &face.frame.origin + (&verts[i] - &face.frame.origin) * 0.9),
            );
            for start in starts {
                if let Some(x) = face_stationary(&face.frame, &start) {
                    if hull.is_inside(&x) {
                        best.offer(x);
                    }
                }
            }
        }
    }
    best.into_result()
}

/// Column-wise grid estimate of the maximum of `∏ x_i`.
pub fn estimate_max_coord_product(
    hull: &Hull,
    resolution: Resolution,
) -> Result<CoordProduct, HullError> {
    check_structure(hull)?;
    let d = hull.dim();
    let (lo, hi) = hull.bounds();
    let lo_c = lo.rows(0, d - 1).into_owned();
    let hi_c = hi.rows(0, d - 1).into_owned();
    let grid = Grid::covering(&lo_c, &hi_c, resolution, 0);
    let mut best = Best::default();
    grid.for_each(|y| {
        let Some((zlo, zhi)) = column_interval(hull, y) else {
            return;
        };
        let py: f64 = y.iter().product();
        let mut x = DVector::zeros(d);
        x.rows_mut(0, d - 1).copy_from(y);
        x[d - 1] = if py >= 0.0 { zhi } else { zlo };
        best.offer(x);
    });
    if best.0.is_none() {
        warn!(
            resolution = resolution.get(),
            "no grid column met the hull; falling back to vertices"
        );
        for v in hull.vertices() {
            best.offer(v.clone());
        }
    }
    best.into_result()
}

impl Hull {
    /// See [`max_coord_product`].
    pub fn max_coord_product(&self) -> Result<CoordProduct, HullError> {
        max_coord_product(self)
    }

    /// See [`estimate_max_coord_product`].
    pub fn estimate_max_coord_product(
        &self,
        resolution: Resolution,
    ) -> Result<CoordProduct, HullError> {
        estimate_max_coord_product(self, resolution)
    }
}

/// Stationary point of the product on the plane `n·x = c`, if all `n_i != 0`.
fn facet_stationary(h: &Halfspace) -> Option<DVector<f64>> {
    let d = h.n.len() as f64;
    if h.n.iter().any(|x| x.abs() <= 1e-12) {
        return None;
    }
    Some(h.n.map(|ni| h.c / (d * ni)))
}

/// Parameters `t ∈ [0, 1]` where `d/dt ∏ (a_i + t (b_i - a_i))` vanishes.
fn edge_stationary(a: &DVector<f64>, b: &DVector<f64>) -> Vec<f64> {
    // coefficients of the product polynomial, lowest degree first
    let mut poly = vec![1.0];
    for (ai, bi) in a.iter().zip(b.iter()) {
        let di = bi - ai;
        let mut next = vec![0.0; poly.len() + 1];
        for (k, p) in poly.iter().enumerate() {
            next[k] += p * ai;
            next[k + 1] += p * di;
        }
        poly = next;
    }
    let deriv: Vec<f64> = poly
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, p)| k as f64 * p)
        .collect();
    let roots = if deriv.len() <= 3 {
        quadratic_roots(
            deriv[0],
            deriv.get(1).copied().unwrap_or(0.0),
            deriv.get(2).copied().unwrap_or(0.0),
        )
    } else {
        bracketed_roots(&deriv, 8 * deriv.len())
    };
    roots.into_iter().filter(|t| (0.0..=1.0).contains(t)).collect()
}

/// Real roots of `c0 + c1 t + c2 t^2`.
fn quadratic_roots(c0: f64, c1: f64, c2: f64) -> Vec<f64> {
    let scale = c0.abs() + c1.abs() + c2.abs();
    if scale == 0.0 {
        return Vec::new();
    }
    if c2.abs() <= 1e-14 * scale {
        if c1.abs() <= 1e-14 * scale {
            return Vec::new();
        }
        return vec![-c0 / c1];
    }
    let disc = c1 * c1 - 4.0 * c2 * c0;
    if disc < 0.0 {
        return Vec::new();
    }
    let q = -0.5 * (c1 + c1.signum() * disc.sqrt());
    if q == 0.0 {
        return vec![0.0];
    }
    vec![q / c2, c0 / q]
}

fn eval_poly(coeffs: &[f64], t: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Sign changes of `coeffs` on `[0, 1]`, refined by bisection.
fn bracketed_roots(coeffs: &[f64], samples: usize) -> Vec<f64> {
    let mut roots = Vec::new();
    let mut t0 = 0.0;
    let mut f0 = eval_poly(coeffs, t0);
    for s in 1..=samples {
        let t1 = s as f64 / samples as f64;
        let f1 = eval_poly(coeffs, t1);
        if f0 == 0.0 {
            roots.push(t0);
        } else if f0 * f1 < 0.0 {
            let (mut lo, mut hi, mut flo) = (t0, t1, f0);
            for _ in 0..ROOT_BISECTIONS {
                let mid = 0.5 * (lo + hi);
                let fm = eval_poly(coeffs, mid);
                if fm * flo <= 0.0 {
                    hi = mid;
                } else {
                    lo = mid;
                    flo = fm;
                }
            }
            roots.push(0.5 * (lo + hi));
        }
        t0 = t1;
        f0 = f1;
    }
    if f0 == 0.0 {
        roots.push(1.0);
    }
    roots
}

/// Newton iteration for a stationary point of `Σ log|x_i|` on `frame`.
fn face_stationary(frame: &AffineFrame, start: &DVector<f64>) -> Option<DVector<f64>> {
    let u = &frame.basis;
    let mut x = start.clone();
    if x.iter().any(|v| *v == 0.0) {
        return None;
    }
    for _ in 0..NEWTON_MAX_ITERS {
        let inv = x.map(|v| 1.0 / v);
        let g = u.transpose() * &inv;
        let w = DMatrix::from_diagonal(&x.map(|v| 1.0 / (v * v)));
        let h = u.transpose() * w * u;
        let step = h.lu().solve(&g)?;
        // ascent step along the face: y += H^{-1} g
        let dx = u * &step;
        let mut alpha = 1.0;
        let mut next = &x + &dx;
        while next.iter().zip(x.iter()).any(|(n, o)| n * o <= 0.0) {
            alpha *= 0.5;
            if alpha < 1e-12 {
                return None;
            }
            next = &x + &dx * alpha;
        }
        let moved = (&next - &x).norm();
        x = next;
        if moved <= 1e-13 * (1.0 + x.norm()) {
            return Some(x);
        }
    }
    None
}

/// Feasible range of the last coordinate above grid column `y`.
fn column_interval(hull: &Hull, y: &DVector<f64>) -> Option<(f64, f64)> {
    let d = hull.dim();
    let eps = hull.tolerances().feas;
    let (lo, hi) = hull.bounds();
    let (mut zlo, mut zhi) = (lo[d - 1], hi[d - 1]);
    for h in hull.facets() {
        let rest = h.c - (0..d - 1).map(|j| h.n[j] * y[j]).sum::<f64>();
        let nz = h.n[d - 1];
        if nz.abs() <= 1e-12 {
            if rest < -eps {
                return None;
            }
            continue;
        }
        let t = rest / nz;
        if nz > 0.0 {
            zhi = zhi.min(t);
        } else {
            zlo = zlo.max(t);
        }
    }
    if zlo > zhi + eps {
        None
    } else if zlo > zhi {
        let mid = 0.5 * (zlo + zhi);
        Some((mid, mid))
    } else {
        Some((zlo, zhi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_hull;
    use crate::options::OptionMap;
    use crate::special::{hypercube, simplex, unit_square};
    use nalgebra::dvector;

    #[test]
    fn square_max_is_far_corner() {
        let sq = unit_square().unwrap();
        let best = sq.max_coord_product().unwrap();
        assert!((best.value - 1.0).abs() < 1e-12);
        assert!((best.point - dvector![1.0, 1.0]).norm() < 1e-12);
    }

    #[test]
    fn simplex_max_on_facet_interior() {
        // x + y + z <= 3, x, y, z >= 0: maximum 1 at (1, 1, 1)
        let s = simplex(3, 3.0).unwrap();
        let best = s.max_coord_product().unwrap();
        assert!((best.value - 1.0).abs() < 1e-9, "{best:?}");
        assert!((best.point - dvector![1.0, 1.0, 1.0]).norm() < 1e-6);
    }

    #[test]
    fn triangle_max_on_edge() {
        // segment x + y = 2 between (0,2) and (2,0); maximum 1 at (1,1)
        let t = simplex(2, 2.0).unwrap();
        let best = t.max_coord_product().unwrap();
        assert!((best.value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn product_of_triangles_max_on_two_face() {
        // x1 + 2 x2 <= 4 and 3 x3 + x4 <= 3 with x >= 0: the maximum 1.5 at
        // (2, 1, 0.5, 1.5) lies inside a 2-face, away from edges and facets
        let left = [(0.0, 0.0), (4.0, 0.0), (0.0, 2.0)];
        let right = [(0.0, 0.0), (1.0, 0.0), (0.0, 3.0)];
        let mut pts = Vec::new();
        for &(a, b) in &left {
            for &(c, d) in &right {
                pts.push(dvector![a, b, c, d]);
            }
        }
        let hull = build_hull(&pts, &OptionMap::new()).unwrap();
        assert_eq!(hull.vertices().len(), 9);
        let best = hull.max_coord_product().unwrap();
        assert!((best.value - 1.5).abs() < 1e-9, "{best:?}");
        assert!((best.point - dvector![2.0, 1.0, 0.5, 1.5]).norm() < 1e-6);
    }

    #[test]
    fn edge_maximum_in_3d() {
        // prism over x + y <= 2 with z in [1, 1.5]: maximum x·y·z = 1.5 on an edge
        let mut pts = Vec::new();
        for z in [1.0, 1.5] {
            pts.push(dvector![0.0, 0.0, z]);
            pts.push(dvector![2.0, 0.0, z]);
            pts.push(dvector![0.0, 2.0, z]);
        }
        let hull = build_hull(&pts, &OptionMap::new()).unwrap();
        let best = hull.max_coord_product().unwrap();
        assert!((best.value - 1.5).abs() < 1e-9, "{best:?}");
        assert!((best.point - dvector![1.0, 1.0, 1.5]).norm() < 1e-6);
    }

    #[test]
    fn negative_orthant_maximum_is_least_negative_vertex() {
        let pts = vec![
            dvector![-3.0, 1.0],
            dvector![-1.0, 1.0],
            dvector![-1.0, 2.0],
            dvector![-3.0, 2.0],
        ];
        let hull = build_hull(&pts, &OptionMap::new()).unwrap();
        let best = hull.max_coord_product().unwrap();
        assert!((best.value + 1.0).abs() < 1e-12, "{best:?}");
        let est = hull
            .estimate_max_coord_product(Resolution::new(8).unwrap())
            .unwrap();
        assert!((est.value + 1.0).abs() < 1e-9, "{est:?}");
    }

    #[test]
    fn estimate_approaches_exact_within_bound() {
        let s = simplex(3, 3.0).unwrap();
        let exact = s.max_coord_product().unwrap().value;
        for res in [10, 20, 40, 80] {
            let est = s
                .estimate_max_coord_product(Resolution::new(res).unwrap())
                .unwrap()
                .value;
            assert!(est <= exact + 1e-9);
            assert!(exact - est <= EMPIRICAL_ERROR_CONSTANT_3D / res as f64);
        }
    }

    #[test]
    fn estimate_on_cube_hits_corner() {
        let c = hypercube(3, 1.0).unwrap();
        let est = c
            .estimate_max_coord_product(Resolution::new(4).unwrap())
            .unwrap();
        assert!((est.value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn four_dimensional_hypercube() {
        let c = hypercube(4, 2.0).unwrap();
        let best = c.max_coord_product().unwrap();
        assert!((best.value - 16.0).abs() < 1e-9);
    }

    #[test]
    fn quadratic_roots_cover_degenerate_cases() {
        assert!(quadratic_roots(0.0, 0.0, 0.0).is_empty());
        assert_eq!(quadratic_roots(-2.0, 4.0, 0.0), vec![0.5]);
        let mut r = quadratic_roots(2.0, -3.0, 1.0);
        r.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((r[0] - 1.0).abs() < 1e-12 && (r[1] - 2.0).abs() < 1e-12);
        assert!(quadratic_roots(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn bracketed_roots_find_interior_root() {
        // (t - 0.25)(t - 0.75)(t + 1)
        let c = [0.1875, -0.8125, 0.0, 1.0];
        let r = bracketed_roots(&c, 7);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.25).abs() < 1e-12);
        assert!((r[1] - 0.75).abs() < 1e-12);
    }
}
