//! Named-option configuration layer.
//!
//! Callers hand the adapter a `key -> value` map of strings. Recognized keys
//! are parsed into `HullOptions`; everything else is forwarded to the kernel
//! untouched via `KernelConfig::extra`.
//!
//! Recognized keys (case-insensitive; aliases separated by `/`):
//! - `tolerance` / `eps`: positive relative tolerance.
//! - `degeneracy`: `reject` or `joggle`.
//! - `joggle-seed`: RNG seed used by `joggle`.
//! - `recompute-hulls` / `recompute-hull`: verification retries.
//! - `expand-hulls-exactly` / `exact-hull-expansion`: boolean.
//! - `hull-mcp-resolution` / `hull-max-coord-product-resolution`: positive integer.

use std::collections::BTreeMap;

use crate::cfg::FEAS_EPS;
use crate::error::HullError;

/// Raw option map as handed over by callers.
pub type OptionMap = BTreeMap<String, String>;

/// Outward offset strategy selected at the call site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpansionMode {
    /// Translate every facet hyperplane by the margin; recompute vertices.
    #[default]
    Exact,
    /// Push every vertex away from the centroid by the margin; rebuild.
    Approximate,
}

impl ExpansionMode {
    #[inline]
    pub fn from_exact_flag(exact: bool) -> Self {
        if exact {
            Self::Exact
        } else {
            Self::Approximate
        }
    }

    #[inline]
    pub fn is_exact(self) -> bool {
        matches!(self, Self::Exact)
    }
}

/// Grid density of the approximation routines. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Resolution(usize);

impl Resolution {
    pub const DEFAULT: Resolution = Resolution(100);

    pub fn new(n: usize) -> Result<Self, HullError> {
        if n == 0 {
            return Err(HullError::invalid(
                "resolution",
                "0",
                "resolution must be positive",
            ));
        }
        Ok(Self(n))
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What the adapter does with input that does not span the full dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Degeneracy {
    /// Report `DegenerateInput`.
    #[default]
    Reject,
    /// Perturb every coordinate by a seeded offset of tolerance scale first.
    Joggle { seed: u64 },
}

/// Configuration handed to a `HullKernel`.
#[derive(Clone, Debug, PartialEq)]
pub struct KernelConfig {
    /// Relative tolerance; kernels scale it by the input extent.
    pub tolerance: f64,
    /// Options the adapter does not recognize, forwarded unchanged.
    pub extra: OptionMap,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tolerance: FEAS_EPS,
            extra: OptionMap::new(),
        }
    }
}

/// Parsed options for construction, expansion and extremum search.
#[derive(Clone, Debug, PartialEq)]
pub struct HullOptions {
    pub tolerance: f64,
    pub degeneracy: Degeneracy,
    pub recompute_hulls: u32,
    pub expansion: ExpansionMode,
    pub mcp_resolution: Resolution,
    pub extra: OptionMap,
}

impl Default for HullOptions {
    fn default() -> Self {
        Self {
            tolerance: FEAS_EPS,
            degeneracy: Degeneracy::Reject,
            recompute_hulls: 1,
            expansion: ExpansionMode::Exact,
            mcp_resolution: Resolution::DEFAULT,
            extra: OptionMap::new(),
        }
    }
}

impl HullOptions {
    /// Parse a raw option map; unknown keys end up in `extra`.
    pub fn from_map(map: &OptionMap) -> Result<Self, HullError> {
        let mut out = Self::default();
        let mut joggle = false;
        let mut seed = 0u64;
        for (key, value) in map {
            let lc = key.trim().to_ascii_lowercase();
            let v = value.trim();
            match lc.as_str() {
                "tolerance" | "eps" => {
                    out.tolerance = parse_positive_f64(key, v)?;
                }
                "degeneracy" => match v.to_ascii_lowercase().as_str() {
                    "reject" => joggle = false,
                    "joggle" => joggle = true,
                    _ => {
                        return Err(HullError::invalid(key, v, "expected `reject` or `joggle`"))
                    }
                },
                "joggle-seed" => {
                    seed = v
                        .parse::<u64>()
                        .map_err(|_| HullError::invalid(key, v, "expected an unsigned integer"))?;
                }
                "recompute-hulls" | "recompute-hull" => {
                    out.recompute_hulls = v.parse::<u32>().map_err(|_| {
                        HullError::invalid(key, v, "expected a non-negative integer")
                    })?;
                }
                "expand-hulls-exactly" | "exact-hull-expansion" => {
                    out.expansion = ExpansionMode::from_exact_flag(parse_bool(key, v)?);
                }
                "hull-mcp-resolution" | "hull-max-coord-product-resolution" => {
                    let n = v.parse::<usize>().map_err(|_| {
                        HullError::invalid(key, v, "expected a positive integer")
                    })?;
                    out.mcp_resolution = Resolution::new(n)
                        .map_err(|_| HullError::invalid(key, v, "resolution must be positive"))?;
                }
                _ => {
                    out.extra.insert(key.clone(), value.clone());
                }
            }
        }
        if joggle {
            out.degeneracy = Degeneracy::Joggle { seed };
        }
        Ok(out)
    }

    /// Kernel-facing view: tolerance plus the forwarded keys.
    pub fn kernel_config(&self) -> KernelConfig {
        KernelConfig {
            tolerance: self.tolerance,
            extra: self.extra.clone(),
        }
    }
}

fn parse_positive_f64(key: &str, v: &str) -> Result<f64, HullError> {
    let x = v
        .parse::<f64>()
        .map_err(|_| HullError::invalid(key, v, "expected a number"))?;
    if !(x.is_finite() && x > 0.0) {
        return Err(HullError::invalid(key, v, "must be positive and finite"));
    }
    Ok(x)
}

fn parse_bool(key: &str, v: &str) -> Result<bool, HullError> {
    match v.to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
        _ => Err(HullError::invalid(key, v, "expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_from_empty_map() {
        let o = HullOptions::from_map(&OptionMap::new()).unwrap();
        assert_eq!(o, HullOptions::default());
        assert_eq!(o.mcp_resolution.get(), 100);
        assert!(o.expansion.is_exact());
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        let o = HullOptions::from_map(&map(&[
            ("EPS", "1e-6"),
            ("exact-hull-expansion", "off"),
            ("hull-max-coord-product-resolution", "40"),
            ("Recompute-Hull", "3"),
        ]))
        .unwrap();
        assert!((o.tolerance - 1e-6).abs() < 1e-18);
        assert_eq!(o.expansion, ExpansionMode::Approximate);
        assert_eq!(o.mcp_resolution.get(), 40);
        assert_eq!(o.recompute_hulls, 3);
    }

    #[test]
    fn unknown_keys_are_forwarded_to_kernel() {
        let o = HullOptions::from_map(&map(&[("Qt", ""), ("tolerance", "1e-8")])).unwrap();
        let k = o.kernel_config();
        assert_eq!(k.extra.get("Qt").map(String::as_str), Some(""));
        assert!(!k.extra.contains_key("tolerance"));
    }

    #[test]
    fn joggle_picks_up_seed_in_any_order() {
        let o =
            HullOptions::from_map(&map(&[("joggle-seed", "7"), ("degeneracy", "joggle")])).unwrap();
        assert_eq!(o.degeneracy, Degeneracy::Joggle { seed: 7 });
    }

    #[test]
    fn out_of_domain_values_are_rejected() {
        for (k, v) in [
            ("hull-mcp-resolution", "0"),
            ("hull-mcp-resolution", "-3"),
            ("tolerance", "-1"),
            ("tolerance", "nan"),
            ("expand-hulls-exactly", "maybe"),
            ("degeneracy", "ignore"),
        ] {
            let err = HullOptions::from_map(&map(&[(k, v)])).unwrap_err();
            assert!(
                matches!(err, HullError::InvalidConfiguration { .. }),
                "{k}={v} gave {err:?}"
            );
        }
    }

    #[test]
    fn resolution_rejects_zero() {
        assert!(Resolution::new(0).is_err());
        assert_eq!(Resolution::new(5).unwrap().get(), 5);
    }
}
