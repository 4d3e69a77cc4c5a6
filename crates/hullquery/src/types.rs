//! Core types: unit-normal half-spaces and the immutable `Hull`.

use nalgebra::DVector;

use crate::cfg::Tolerances;
use crate::error::HullError;
use crate::faces::FaceLattice;
use crate::util::{affine_rank, centroid, lex_cmp};

/// Closed half-space `n · x <= c`.
///
/// Invariants (inside a `Hull`):
/// - `n` has unit length and points outward.
/// - Membership uses `<= c + eps`.
#[derive(Clone, Debug, PartialEq)]
pub struct Halfspace {
    pub n: DVector<f64>,
    pub c: f64,
}

impl Halfspace {
    #[inline]
    pub fn new(n: DVector<f64>, c: f64) -> Self {
        Self { n, c }
    }

    /// Signed slack `c - n·p`; negative outside.
    #[inline]
    pub fn slack(&self, p: &DVector<f64>) -> f64 {
        self.c - self.n.dot(p)
    }

    #[inline]
    pub fn satisfies_eps(&self, p: &DVector<f64>, eps: f64) -> bool {
        self.n.dot(p) <= self.c + eps
    }

    /// Rescale to a unit normal; `None` for a vanishing or non-finite normal.
    pub fn normalized(&self) -> Option<Self> {
        let norm = self.n.norm();
        if !norm.is_finite() || norm <= 0.0 || !self.c.is_finite() {
            return None;
        }
        Some(Self::new(&self.n / norm, self.c / norm))
    }

    fn same_plane(&self, other: &Halfspace, tol: f64) -> bool {
        (&self.n - &other.n).norm() < tol && (self.c - other.c).abs() < tol
    }
}

/// Full-dimensional convex polytope with both representations.
///
/// Invariants:
/// - `vertices` are the extreme points, sorted lexicographically.
/// - `facets` have unit outward normals; their intersection equals the
///   convex hull of `vertices`.
/// - `incidence[i]` lists the vertices on facet `i` (sorted) and spans a
///   `dim - 1` affine subspace.
/// - Never mutated after construction; derived hulls are new values.
#[derive(Clone, Debug)]
pub struct Hull {
    dim: usize,
    vertices: Vec<DVector<f64>>,
    facets: Vec<Halfspace>,
    incidence: Vec<Vec<usize>>,
    centroid: DVector<f64>,
    lo: DVector<f64>,
    hi: DVector<f64>,
    tol: Tolerances,
    lattice: FaceLattice,
}

impl Hull {
    /// Assemble a hull from kernel-style output.
    ///
    /// Normals are normalized and re-oriented against the vertex centroid, so
    /// callers need not guarantee orientation. Duplicate planes and supporting
    /// planes that only touch a lower-dimensional face are dropped.
    pub(crate) fn from_parts(
        dim: usize,
        mut vertices: Vec<DVector<f64>>,
        facets: Vec<Halfspace>,
        tol: Tolerances,
    ) -> Result<Self, HullError> {
        if dim < 2 {
            return Err(HullError::degenerate("hull dimension must be at least 2"));
        }
        if vertices.len() < dim + 1 {
            return Err(HullError::degenerate(format!(
                "{} vertices cannot bound a {dim}-D hull",
                vertices.len()
            )));
        }
        vertices.sort_by(lex_cmp);
        let center = centroid(&vertices, dim);

        let mut oriented: Vec<Halfspace> = Vec::with_capacity(facets.len());
        for h in &facets {
            let Some(mut h) = h.normalized() else {
                continue;
            };
            if h.n.dot(&center) > h.c {
                h = Halfspace::new(-h.n, -h.c);
            }
            if oriented.iter().all(|o| !o.same_plane(&h, tol.tight)) {
                oriented.push(h);
            }
        }

        let mut kept = Vec::with_capacity(oriented.len());
        let mut incidence = Vec::with_capacity(oriented.len());
        for h in oriented {
            let on: Vec<usize> = vertices
                .iter()
                .enumerate()
                .filter(|(_, v)| h.slack(v).abs() <= tol.tight)
                .map(|(i, _)| i)
                .collect();
            let refs: Vec<&DVector<f64>> = on.iter().map(|&i| &vertices[i]).collect();
            if on.len() >= dim && affine_rank(&refs, tol.rank) == dim - 1 {
                kept.push(h);
                incidence.push(on);
            }
        }
        if kept.len() < dim + 1 {
            return Err(HullError::degenerate(format!(
                "only {} facets support a {dim}-D hull",
                kept.len()
            )));
        }

        let mut lo = vertices[0].clone();
        let mut hi = vertices[0].clone();
        for v in &vertices[1..] {
            lo = lo.inf(v);
            hi = hi.sup(v);
        }
        let lattice = FaceLattice::build(dim, &vertices, &incidence, &tol);
        Ok(Self {
            dim,
            vertices,
            facets: kept,
            incidence,
            centroid: center,
            lo,
            hi,
            tol,
            lattice,
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }
    #[inline]
    pub fn vertices(&self) -> &[DVector<f64>] {
        &self.vertices
    }
    #[inline]
    pub fn facets(&self) -> &[Halfspace] {
        &self.facets
    }
    /// Vertex indices lying on facet `i`.
    #[inline]
    pub fn facet_vertices(&self, i: usize) -> &[usize] {
        &self.incidence[i]
    }
    /// Mean of the vertices.
    #[inline]
    pub fn centroid(&self) -> &DVector<f64> {
        &self.centroid
    }
    /// Per-coordinate `(min, max)` over the vertices.
    #[inline]
    pub fn bounds(&self) -> (&DVector<f64>, &DVector<f64>) {
        (&self.lo, &self.hi)
    }
    #[inline]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tol
    }
    #[inline]
    pub(crate) fn lattice(&self) -> &FaceLattice {
        &self.lattice
    }

    /// Vertex list as plain rows of coordinates (debug dumps, CSV/JSON).
    pub fn vertex_table(&self) -> Vec<Vec<f64>> {
        self.vertices
            .iter()
            .map(|v| v.iter().copied().collect())
            .collect()
    }

    /// True iff every vertex of `inner` is inside `self`.
    pub fn contains_hull(&self, inner: &Hull) -> bool {
        assert_eq!(self.dim, inner.dim, "hull dimensions disagree");
        inner.vertices.iter().all(|v| self.is_inside(v))
    }
}
