//! Errors surfaced by hull construction and queries.
//!
//! Structural problems (degenerate input, kernel breakdown, bad options) are
//! values. Imprecision of the grid estimators is never an error; it is carried
//! by their documented bounds.

use std::fmt;

/// Error type shared by the adapter, expansion and extremum routines.
#[derive(Debug, Clone, PartialEq)]
pub enum HullError {
    /// Too few points, lower-dimensional point sets, or an empty hull.
    DegenerateInput { reason: String },
    /// The construction kernel broke down numerically.
    KernelFailure { reason: String },
    /// Points (or a point and a hull) disagree on the dimension.
    DimensionMismatch { expected: usize, found: usize },
    /// A named option carries a value outside its accepted domain.
    InvalidConfiguration {
        key: String,
        value: String,
        reason: String,
    },
}

impl HullError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn kernel(reason: impl Into<String>) -> Self {
        Self::KernelFailure {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateInput { .. })
    }
}

impl fmt::Display for HullError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateInput { reason } => write!(f, "degenerate input: {reason}"),
            Self::KernelFailure { reason } => write!(f, "hull kernel failure: {reason}"),
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "dimension mismatch: expected {expected}-D point, found {found}-D"
            ),
            Self::InvalidConfiguration { key, value, reason } => {
                write!(f, "invalid value {value:?} for option {key:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for HullError {}
