//! Tolerance defaults for hull construction and queries (internal).
//!
//! Policy
//! - Defaults are fixed, relative constants. Each hull scales them by the
//!   extent of its input point set once, at construction, and carries the
//!   absolute values in `Tolerances`. Queries never re-derive them.

/// Relative feasibility epsilon used by membership and geometric dedup.
pub(crate) const FEAS_EPS: f64 = 1e-9;
/// Relative tightness threshold for "near-active" inequalities (incidence).
pub(crate) const TIGHT_EPS: f64 = 1e-7;
/// Relative singular-value threshold for affine rank decisions.
pub(crate) const RANK_EPS: f64 = 1e-9;
/// Absolute threshold under which a cofactor normal is treated as zero.
pub(crate) const DET_EPS: f64 = 1e-12;

/// Above this many input points the adapter prefilters with a subsample hull.
pub(crate) const LARGE_INPUT_POINTS: usize = 256;
/// Prefilter threshold for D >= 3, where plane enumeration costs O(N^(D+1)).
pub(crate) const LARGE_INPUT_POINTS_HIGH_DIM: usize = 64;

/// Input size above which the adapter prefilters, per dimension.
#[inline]
pub(crate) fn large_input_threshold(dim: usize) -> usize {
    if dim <= 2 {
        LARGE_INPUT_POINTS
    } else {
        LARGE_INPUT_POINTS_HIGH_DIM
    }
}

/// Absolute tolerances of one hull (relative constants times input extent).
///
/// Invariants:
/// - All fields are positive and finite.
/// - `tight >= feas`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub feas: f64,
    pub tight: f64,
    pub rank: f64,
}

impl Tolerances {
    /// Scale the relative defaults by `extent`; `rel` overrides `FEAS_EPS`.
    pub fn scaled(rel: f64, extent: f64) -> Self {
        let scale = if extent.is_finite() && extent > 0.0 {
            extent
        } else {
            1.0
        };
        let ratio = rel / FEAS_EPS;
        Self {
            feas: rel * scale,
            tight: (TIGHT_EPS * ratio).max(rel) * scale,
            rank: (RANK_EPS * ratio).max(rel) * scale,
        }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::scaled(FEAS_EPS, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_tolerances_track_extent() {
        let t = Tolerances::scaled(FEAS_EPS, 100.0);
        assert!((t.feas - 1e-7).abs() < 1e-18);
        assert!((t.tight - 1e-5).abs() < 1e-16);
        assert!(t.tight >= t.feas);
    }

    #[test]
    fn prefilter_threshold_drops_above_two_dimensions() {
        assert_eq!(large_input_threshold(2), LARGE_INPUT_POINTS);
        assert_eq!(large_input_threshold(3), LARGE_INPUT_POINTS_HIGH_DIM);
        assert!(large_input_threshold(4) < large_input_threshold(2));
    }

    #[test]
    fn degenerate_extent_falls_back_to_unit_scale() {
        assert_eq!(Tolerances::scaled(FEAS_EPS, 0.0), Tolerances::default());
        assert_eq!(Tolerances::scaled(FEAS_EPS, f64::NAN), Tolerances::default());
    }
}
