//! Point tables: header-less CSV in, `DVector` rows out.

use std::path::Path;

use anyhow::{bail, Context, Result};
use nalgebra::DVector;
use polars::prelude::*;

/// Read every row of a header-less numeric CSV as one point.
pub fn read_points(path: &Path) -> Result<Vec<DVector<f64>>> {
    let df = LazyCsvReader::new(path)
        .with_has_header(false)
        .with_infer_schema_length(Some(100))
        .finish()
        .with_context(|| format!("opening {}", path.display()))?
        .collect()
        .with_context(|| format!("reading {}", path.display()))?;
    let (rows, cols) = df.shape();
    if cols == 0 {
        bail!("{} has no columns", path.display());
    }
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(cols);
    for name in df.get_column_names() {
        let series = df
            .column(name)?
            .cast(&DataType::Float64)
            .with_context(|| format!("column {name} of {} is not numeric", path.display()))?;
        let mut values = Vec::with_capacity(rows);
        for (row, v) in series.f64()?.into_iter().enumerate() {
            match v {
                Some(x) => values.push(x),
                None => bail!("missing value in {} at row {row}, column {name}", path.display()),
            }
        }
        columns.push(values);
    }
    Ok((0..rows)
        .map(|r| DVector::from_fn(cols, |c, _| columns[c][r]))
        .collect())
}
