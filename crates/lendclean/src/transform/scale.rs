//! Min-max scaling to the unit interval.

use crate::error::Result;
use crate::table::{Column, Dataset, Value};

/// Observed `(min, max)` of a numeric column, or `None` if nothing is observed.
pub fn observed_range(dataset: &Dataset, column: &str) -> Result<Option<(f64, f64)>> {
    let range = dataset
        .column(column)?
        .numeric(column)?
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });
    Ok(range)
}

/// Rescale each named column so its minimum maps to 0 and its maximum to 1.
///
/// A zero-variance column divides by zero and yields NaN; callers are
/// expected to leave such columns out.
pub fn min_max_scale<S: AsRef<str>>(dataset: Dataset, columns: &[S]) -> Result<Dataset> {
    let mut dataset = dataset;
    for name in columns {
        let name = name.as_ref();
        let Some((min, max)) = observed_range(&dataset, name)? else {
            continue;
        };
        let span = max - min;
        let scaled: Column = dataset
            .column(name)?
            .numeric(name)?
            .into_iter()
            .map(|v| v.map_or(Value::Missing, |v| Value::Float((v - min) / span)))
            .collect();
        dataset = dataset.with_column(name, scaled)?;
    }
    Ok(dataset)
}
