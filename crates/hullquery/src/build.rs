//! Construction adapter: point set -> verified `Hull`.
//!
//! Steps
//! - Validate shape (dimension >= 2, consistent lengths, at least D+1 points).
//! - Optionally joggle inputs (seeded) so flat sets become full-dimensional.
//! - Prefilter large inputs through a subsample hull.
//! - Call the kernel, normalize and re-orient its output (`Hull::from_parts`).
//! - Verify: every input point inside, every vertex on the inner side of every
//!   facet. On failure rebuild from the hull's own vertices up to
//!   `recompute-hulls` times.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::cfg::{large_input_threshold, Tolerances};
use crate::error::HullError;
use crate::expand::expand_with;
use crate::kernel::{EnumerationKernel, HullKernel, KernelError, RawHull};
use crate::options::{Degeneracy, HullOptions, OptionMap};
use crate::types::Hull;
use crate::util::extent;

/// Joggle amplitude relative to `tolerance * extent`.
const JOGGLE_FACTOR: f64 = 1e4;

/// Build a hull with the built-in kernel from a raw option map.
pub fn build_hull(points: &[DVector<f64>], config: &OptionMap) -> Result<Hull, HullError> {
    HullBuilder::new(HullOptions::from_map(config)?).build(points)
}

/// Hull construction over a pluggable kernel.
#[derive(Clone, Debug)]
pub struct HullBuilder<K = EnumerationKernel> {
    kernel: K,
    options: HullOptions,
}

impl Default for HullBuilder<EnumerationKernel> {
    fn default() -> Self {
        Self::new(HullOptions::default())
    }
}

impl HullBuilder<EnumerationKernel> {
    pub fn new(options: HullOptions) -> Self {
        Self {
            kernel: EnumerationKernel,
            options,
        }
    }
}

impl<K: HullKernel> HullBuilder<K> {
    pub fn with_kernel(kernel: K, options: HullOptions) -> Self {
        Self { kernel, options }
    }

    #[inline]
    pub fn options(&self) -> &HullOptions {
        &self.options
    }

    pub fn build(&self, points: &[DVector<f64>]) -> Result<Hull, HullError> {
        let dim = validate_shape(points)?;
        let tol = Tolerances::scaled(self.options.tolerance, extent(points));
        let input: Vec<DVector<f64>> = match self.options.degeneracy {
            Degeneracy::Reject => points.to_vec(),
            Degeneracy::Joggle { seed } => joggle(points, seed, tol.feas * JOGGLE_FACTOR),
        };
        let candidates = self.prefilter(&input, dim, &tol);

        let raw = self.run_kernel(&candidates)?;
        let mut hull = Hull::from_parts(dim, raw.vertices, raw.facets, tol)?;
        let mut attempt = 0u32;
        while let Some(bad) = first_violation(&hull, &input) {
            if attempt >= self.options.recompute_hulls {
                return Err(HullError::kernel(format!(
                    "hull failed verification after {attempt} recomputation(s): {bad}"
                )));
            }
            attempt += 1;
            warn!(attempt, reason = %bad, "hull verification failed; recomputing from vertices");
            let raw = self.run_kernel(hull.vertices())?;
            hull = Hull::from_parts(dim, raw.vertices, raw.facets, tol)?;
        }
        Ok(hull)
    }

    /// Expand with the mode selected in the options.
    pub fn expand(&self, hull: &Hull, margin: f64) -> Result<Hull, HullError> {
        expand_with(hull, margin, self.options.expansion, self)
    }

    fn run_kernel(&self, points: &[DVector<f64>]) -> Result<RawHull, HullError> {
        self.kernel
            .hull(points, &self.options.kernel_config())
            .map_err(|e| match e {
                KernelError::Degenerate { reason } => HullError::degenerate(reason),
                KernelError::Numerical { reason } => HullError::kernel(reason),
            })
    }

    /// Drop points strictly inside the hull of a strided subsample.
    fn prefilter(
        &self,
        points: &[DVector<f64>],
        dim: usize,
        tol: &Tolerances,
    ) -> Vec<DVector<f64>> {
        let limit = large_input_threshold(dim);
        if points.len() <= limit {
            return points.to_vec();
        }
        let stride = points.len().div_ceil(limit);
        let sample: Vec<DVector<f64>> = points.iter().step_by(stride).cloned().collect();
        let Ok(raw) = self.run_kernel(&sample) else {
            return points.to_vec();
        };
        let Ok(inner) = Hull::from_parts(dim, raw.vertices, raw.facets, *tol) else {
            return points.to_vec();
        };
        let mut kept: Vec<DVector<f64>> = inner.vertices().to_vec();
        kept.extend(
            points
                .iter()
                .filter(|p| inner.facets().iter().any(|h| h.slack(p) <= tol.tight))
                .cloned(),
        );
        debug!(
            input = points.len(),
            sample = sample.len(),
            kept = kept.len(),
            "prefiltered large input through subsample hull"
        );
        kept
    }
}

fn validate_shape(points: &[DVector<f64>]) -> Result<usize, HullError> {
    let Some(first) = points.first() else {
        return Err(HullError::degenerate("empty point set"));
    };
    let dim = first.len();
    if let Some(p) = points.iter().find(|p| p.len() != dim) {
        return Err(HullError::DimensionMismatch {
            expected: dim,
            found: p.len(),
        });
    }
    if dim < 2 {
        return Err(HullError::degenerate(format!(
            "hulls need dimension >= 2, got {dim}"
        )));
    }
    if points.len() < dim + 1 {
        return Err(HullError::degenerate(format!(
            "{} points cannot span {dim} dimensions",
            points.len()
        )));
    }
    if points.iter().any(|p| p.iter().any(|x| !x.is_finite())) {
        return Err(HullError::kernel("non-finite coordinate in input"));
    }
    Ok(dim)
}

fn joggle(points: &[DVector<f64>], seed: u64, amplitude: f64) -> Vec<DVector<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    points
        .iter()
        .map(|p| p.map(|x| x + rng.gen_range(-amplitude..=amplitude)))
        .collect()
}

/// First verification failure, described for logging.
fn first_violation(hull: &Hull, input: &[DVector<f64>]) -> Option<String> {
    let eps = hull.tolerances().tight;
    for (i, h) in hull.facets().iter().enumerate() {
        if let Some(v) = hull.vertices().iter().position(|v| h.slack(v) < -eps) {
            return Some(format!("vertex {v} violates facet {i}"));
        }
        if let Some(p) = input.iter().position(|p| h.slack(p) < -eps) {
            return Some(format!("input point {p} outside facet {i}"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;
    use std::cell::Cell;

    fn opts(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn square_from_points_with_interior() {
        let pts = vec![
            dvector![0.0, 0.0],
            dvector![1.0, 0.0],
            dvector![0.0, 1.0],
            dvector![1.0, 1.0],
            dvector![0.5, 0.5],
        ];
        let hull = build_hull(&pts, &OptionMap::new()).unwrap();
        assert_eq!(hull.dim(), 2);
        assert_eq!(hull.vertices().len(), 4);
        assert_eq!(hull.facets().len(), 4);
    }

    #[test]
    fn too_few_points_is_degenerate() {
        let pts = vec![dvector![0.0, 0.0], dvector![1.0, 0.0]];
        let err = build_hull(&pts, &OptionMap::new()).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let pts: Vec<_> = (0..5).map(|i| dvector![i as f64, 2.0 * i as f64]).collect();
        let err = build_hull(&pts, &OptionMap::new()).unwrap_err();
        assert!(err.is_degenerate(), "{err}");
    }

    #[test]
    fn coplanar_3d_points_are_degenerate() {
        let pts = vec![
            dvector![0.0, 0.0, 0.0],
            dvector![1.0, 0.0, 0.0],
            dvector![0.0, 1.0, 0.0],
            dvector![1.0, 1.0, 0.0],
            dvector![0.3, 0.2, 0.0],
        ];
        let err = build_hull(&pts, &OptionMap::new()).unwrap_err();
        assert!(err.is_degenerate(), "{err}");
    }

    #[test]
    fn one_dimensional_input_is_degenerate() {
        let pts = vec![dvector![0.0], dvector![1.0], dvector![2.0]];
        assert!(build_hull(&pts, &OptionMap::new()).unwrap_err().is_degenerate());
    }

    #[test]
    fn mixed_dimensions_report_mismatch() {
        let pts = vec![
            dvector![0.0, 0.0],
            dvector![1.0, 0.0, 0.0],
            dvector![0.0, 1.0],
        ];
        let err = build_hull(&pts, &OptionMap::new()).unwrap_err();
        assert_eq!(
            err,
            HullError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn joggle_makes_flat_input_buildable() {
        let pts = vec![
            dvector![0.0, 0.0, 0.0],
            dvector![1.0, 0.0, 0.0],
            dvector![0.0, 1.0, 0.0],
            dvector![1.0, 1.0, 0.0],
        ];
        let cfg = opts(&[("degeneracy", "joggle"), ("joggle-seed", "11")]);
        let hull = build_hull(&pts, &cfg).unwrap();
        assert_eq!(hull.dim(), 3);
        let (lo, hi) = hull.bounds();
        assert!(hi[2] - lo[2] < 1e-3);
    }

    #[test]
    fn bad_option_surfaces_before_building() {
        let pts = vec![dvector![0.0, 0.0], dvector![1.0, 0.0], dvector![0.0, 1.0]];
        let err = build_hull(&pts, &opts(&[("hull-mcp-resolution", "0")])).unwrap_err();
        assert!(matches!(err, HullError::InvalidConfiguration { .. }));
    }

    #[test]
    fn large_input_prefilter_keeps_the_hull() {
        // dense disc plus four far corners
        let mut pts: Vec<DVector<f64>> = (0..600)
            .map(|i| {
                let t = i as f64 * 0.137;
                let r = 0.9 * ((i % 17) as f64 / 17.0);
                dvector![r * t.cos(), r * t.sin()]
            })
            .collect();
        pts.extend([
            dvector![-2.0, -2.0],
            dvector![2.0, -2.0],
            dvector![2.0, 2.0],
            dvector![-2.0, 2.0],
        ]);
        let hull = build_hull(&pts, &OptionMap::new()).unwrap();
        assert_eq!(hull.vertices().len(), 4);
        assert!(pts.iter().all(|p| hull.is_inside(p)));
    }

    #[test]
    fn prefilter_applies_to_moderate_3d_inputs() {
        let mut pts = crate::special::random_cloud(3, 150, 0.8, 4);
        for mask in 0..8usize {
            pts.push(DVector::from_fn(3, |k, _| if (mask >> k) & 1 == 1 { 1.0 } else { -1.0 }));
        }
        let hull = build_hull(&pts, &OptionMap::new()).unwrap();
        assert_eq!(hull.vertices().len(), 8);
        assert_eq!(hull.facets().len(), 6);
        assert!(pts.iter().all(|p| hull.is_inside(p)));
    }

    /// Kernel that adds a plane cutting off a vertex on its first call.
    struct FlakyKernel {
        calls: Cell<u32>,
    }

    impl HullKernel for FlakyKernel {
        fn hull(
            &self,
            points: &[DVector<f64>],
            cfg: &crate::options::KernelConfig,
        ) -> Result<RawHull, KernelError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            let mut raw = EnumerationKernel.hull(points, cfg)?;
            if n == 0 {
                raw.facets
                    .push(crate::types::Halfspace::new(dvector![1.0, 1.0], 0.0));
            }
            Ok(raw)
        }
    }

    fn square() -> Vec<DVector<f64>> {
        vec![
            dvector![-1.0, -1.0],
            dvector![1.0, -1.0],
            dvector![1.0, 1.0],
            dvector![-1.0, 1.0],
        ]
    }

    #[test]
    fn failed_verification_is_recomputed() {
        let kernel = FlakyKernel { calls: Cell::new(0) };
        let builder = HullBuilder::with_kernel(&kernel, HullOptions::default());
        let hull = builder.build(&square()).unwrap();
        assert_eq!(kernel.calls.get(), 2);
        assert!(hull.is_inside(&dvector![0.99, 0.99]));
    }

    #[test]
    fn verification_without_retries_fails() {
        let kernel = FlakyKernel { calls: Cell::new(0) };
        let options = HullOptions {
            recompute_hulls: 0,
            ..HullOptions::default()
        };
        let err = HullBuilder::with_kernel(&kernel, options)
            .build(&square())
            .unwrap_err();
        assert!(matches!(err, HullError::KernelFailure { .. }));
    }
}
