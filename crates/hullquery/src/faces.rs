//! Face lattice of a hull, stored as an arena indexed by `FaceId`.
//!
//! Algorithm
//! - Facets come straight from the facet/vertex incidence.
//! - Children of a k-face F are the distinct sets `S_F ∩ S_G` over all facets
//!   G whose vertices span a (k-1)-dimensional affine subspace.
//! - Every face carries its affine frame and, per ridge, the in-face
//!   half-space that bounds F at that ridge. Nearest-point queries walk these
//!   bounds downward.
//! - A face is kept only if every one of its vertices lies on its frame
//!   (within the tightness tolerance).
//!
//! Why
//! - Exact boundary distances and the coordinate-product search need faces of
//!   every dimension, not only facets and vertices.

use std::collections::HashMap;

use nalgebra::DVector;
use tracing::warn;

use crate::cfg::Tolerances;
use crate::types::Halfspace;
use crate::util::{affine_frame, AffineFrame};

/// Index of a face in its lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub usize);

#[derive(Clone, Debug)]
pub struct Face {
    /// Affine dimension, `0..dim`.
    pub dim: usize,
    /// Sorted hull vertex indices on this face.
    pub vertices: Vec<usize>,
    /// Faces of dimension `dim - 1` contained in this face.
    pub ridges: Vec<FaceId>,
    pub(crate) frame: AffineFrame,
    /// Aligned with `ridges`: in-face outward half-space at each child.
    pub(crate) bounds: Vec<Halfspace>,
}

#[derive(Clone, Debug, Default)]
pub struct FaceLattice {
    faces: Vec<Face>,
    /// Aligned with hull facets.
    facets: Vec<FaceId>,
}

impl FaceLattice {
    pub(crate) fn build(
        dim: usize,
        vertices: &[DVector<f64>],
        incidence: &[Vec<usize>],
        tol: &Tolerances,
    ) -> Self {
        let frame_of = |idx: &[usize]| {
            let refs: Vec<&DVector<f64>> = idx.iter().map(|&i| &vertices[i]).collect();
            affine_frame(&refs, tol.rank)
        };
        let fits = |frame: &AffineFrame, idx: &[usize]| {
            idx.iter().all(|&i| frame.residual(&vertices[i]) <= tol.tight)
        };
        let mut faces: Vec<Face> = Vec::new();
        let mut index: HashMap<Vec<usize>, FaceId> = HashMap::new();
        let mut facets = Vec::with_capacity(incidence.len());
        for on in incidence {
            let id = FaceId(faces.len());
            let frame = frame_of(on);
            if frame.dim() != dim - 1 || !fits(&frame, on) {
                warn!(
                    facet = facets.len(),
                    frame_dim = frame.dim(),
                    "facet frame does not carry its vertices"
                );
            }
            faces.push(Face {
                dim: dim - 1,
                vertices: on.clone(),
                ridges: Vec::new(),
                frame,
                bounds: Vec::new(),
            });
            index.insert(on.clone(), id);
            facets.push(id);
        }

        let mut level: Vec<FaceId> = facets.clone();
        for k in (1..dim).rev() {
            let mut next: Vec<FaceId> = Vec::new();
            for &fid in &level {
                let mut ridges = Vec::new();
                for on in incidence {
                    let common = intersect_sorted(&faces[fid.0].vertices, on);
                    if common.len() < k || common.len() == faces[fid.0].vertices.len() {
                        continue;
                    }
                    let id = match index.get(&common) {
                        Some(&id) => id,
                        None => {
                            let frame = frame_of(&common);
                            if frame.dim() != k - 1 || !fits(&frame, &common) {
                                continue;
                            }
                            let id = FaceId(faces.len());
                            faces.push(Face {
                                dim: k - 1,
                                vertices: common.clone(),
                                ridges: Vec::new(),
                                frame,
                                bounds: Vec::new(),
                            });
                            index.insert(common, id);
                            next.push(id);
                            id
                        }
                    };
                    if faces[id.0].dim == k - 1 && !ridges.contains(&id) {
                        ridges.push(id);
                    }
                }
                let bounds = ridges
                    .iter()
                    .filter_map(|c| child_bound(&faces[fid.0].frame, &faces[c.0].frame))
                    .collect::<Vec<_>>();
                // a ridge without a usable bound would break the alignment
                if bounds.len() == ridges.len() {
                    faces[fid.0].bounds = bounds;
                    faces[fid.0].ridges = ridges;
                }
            }
            level = next;
        }
        Self { faces, facets }
    }

    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.0]
    }

    /// Face of hull facet `i`.
    #[inline]
    pub fn facet(&self, i: usize) -> FaceId {
        self.facets[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.faces.iter().enumerate().map(|(i, f)| (FaceId(i), f))
    }

    /// All faces of affine dimension `k`.
    pub fn faces_of_dim(&self, k: usize) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.iter().filter(move |(_, f)| f.dim == k)
    }
}

/// Outward half-space of a parent face at one of its ridges, within the
/// parent's affine hull.
fn child_bound(parent: &AffineFrame, child: &AffineFrame) -> Option<Halfspace> {
    let w = &parent.origin;
    let d = child.project(w) - w;
    let n = d.normalize();
    if !n.iter().all(|x| x.is_finite()) || d.norm() <= 0.0 {
        return None;
    }
    let c = n.dot(&child.origin);
    Some(Halfspace::new(n, c))
}

fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_hull;
    use crate::options::OptionMap;
    use crate::special::{hypercube, random_cloud, unit_square};

    #[test]
    fn square_lattice_has_edges_and_vertices() {
        let hull = unit_square().unwrap();
        let lat = hull.lattice();
        assert_eq!(lat.faces_of_dim(1).count(), 4);
        assert_eq!(lat.faces_of_dim(0).count(), 4);
        for (_, f) in lat.faces_of_dim(1) {
            assert_eq!(f.ridges.len(), 2);
            assert_eq!(f.bounds.len(), 2);
        }
    }

    #[test]
    fn cube_lattice_counts() {
        let hull = hypercube(3, 1.0).unwrap();
        let lat = hull.lattice();
        assert_eq!(lat.faces_of_dim(2).count(), 6);
        assert_eq!(lat.faces_of_dim(1).count(), 12);
        assert_eq!(lat.faces_of_dim(0).count(), 8);
        for (_, f) in lat.faces_of_dim(2) {
            assert_eq!(f.ridges.len(), 4);
        }
    }

    #[test]
    fn child_bounds_contain_parent_centroid() {
        let hull = hypercube(3, 2.0).unwrap();
        let lat = hull.lattice();
        for (_, f) in lat.iter() {
            for b in &f.bounds {
                assert!(b.slack(&f.frame.origin) > 0.0);
                assert!((b.n.norm() - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn every_face_frame_carries_its_vertices() {
        for dim in [3usize, 4] {
            for seed in 0..30u64 {
                let pts = random_cloud(dim, 10, 1.0, seed);
                let hull = build_hull(&pts, &OptionMap::new()).unwrap();
                let lat = hull.lattice();
                assert_eq!(lat.faces_of_dim(dim - 1).count(), hull.facets().len());
                for (id, f) in lat.iter() {
                    assert_eq!(f.frame.dim(), f.dim, "dim {dim} seed {seed} {id:?}");
                    for &v in &f.vertices {
                        let r = f.frame.residual(&hull.vertices()[v]);
                        assert!(r < 1e-9, "dim {dim} seed {seed} {id:?}: residual {r}");
                    }
                    assert_eq!(f.ridges.len(), f.bounds.len());
                    if f.dim > 0 {
                        assert!(!f.ridges.is_empty(), "dim {dim} seed {seed} {id:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn intersect_sorted_works() {
        assert_eq!(intersect_sorted(&[0, 2, 4, 6], &[1, 2, 3, 6]), vec![2, 6]);
        assert!(intersect_sorted(&[], &[1]).is_empty());
    }
}
