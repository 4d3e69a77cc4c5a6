//! Convex polytope query engine.
//!
//! A `Hull` is built once from a point set (`build_hull`, `HullBuilder`) and is
//! immutable afterwards. Queries are plain `&self` methods and free functions:
//! membership, interior/boundary/signed distance, outward expansion, and the
//! maximum of the coordinate product, each with a grid-based estimator where
//! one exists.
//!
//! Conventions
//! - Points are `nalgebra::DVector<f64>`; the dimension is a runtime value.
//! - Facets are `n·x <= c` with unit outward `n`.
//! - Construction reports errors as `HullError`; query points of the wrong
//!   dimension are a caller bug and panic.
//! - Hull construction is pluggable through `HullKernel`; `EnumerationKernel`
//!   is the built-in implementation.

pub mod build;
pub(crate) mod cfg;
pub mod coord_prod;
pub mod distance;
pub mod error;
pub mod expand;
pub(crate) mod faces;
pub(crate) mod grid;
pub mod kernel;
pub mod options;
pub mod special;
pub mod types;
pub(crate) mod util;


/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use build::{build_hull, HullBuilder};
pub use cfg::Tolerances;
pub use coord_prod::{
    estimate_max_coord_product, max_coord_product, CoordProduct, EMPIRICAL_ERROR_CONSTANT_3D,
};
pub use distance::DistanceEstimate;
pub use error::HullError;
pub use expand::{expand, expand_with};
pub use kernel::{EnumerationKernel, HullKernel, KernelError, RawHull};
pub use options::{Degeneracy, ExpansionMode, HullOptions, KernelConfig, OptionMap, Resolution};
pub use types::{Halfspace, Hull};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::{
        build_hull, expand, ExpansionMode, Halfspace, Hull, HullBuilder, HullError, HullOptions,
        OptionMap, Resolution,
    };
    pub use nalgebra::{dvector, DVector};
}
