//! Quantile-based flooring and capping.

use crate::error::Result;
use crate::table::{ClampBounds, Column, Dataset, Value};

use super::stats;

/// Lower quantile used as the floor.
pub const FLOOR_QUANTILE: f64 = 0.10;
/// Upper quantile used as the cap.
pub const CAP_QUANTILE: f64 = 0.90;

/// Floor/cap bounds for a column: its 10th and 90th percentiles.
pub fn quantile_bounds(dataset: &Dataset, column: &str) -> Result<Option<ClampBounds>> {
    let values: Vec<f64> = dataset
        .column(column)?
        .numeric(column)?
        .into_iter()
        .flatten()
        .collect();
    Ok(stats::quantile(&values, FLOOR_QUANTILE)
        .zip(stats::quantile(&values, CAP_QUANTILE))
        .map(|(lower, upper)| ClampBounds { lower, upper }))
}

/// Clamp `column` into its [10th, 90th] percentile range.
///
/// The bounds are recorded on the column. Capping an already capped column
/// reuses those bounds, so a second pass changes nothing.
pub fn cap_outliers(dataset: Dataset, column: &str) -> Result<Dataset> {
    let existing = dataset.column(column)?.capped_at();
    let bounds = match existing {
        Some(bounds) => bounds,
        None => match quantile_bounds(&dataset, column)? {
            Some(bounds) => bounds,
            None => {
                tracing::warn!(column, "No observed values to cap");
                return Ok(dataset);
            }
        },
    };

    let mut clamped = 0usize;
    let capped: Column = dataset
        .column(column)?
        .numeric(column)?
        .into_iter()
        .map(|value| match value {
            Some(v) => {
                let c = v.clamp(bounds.lower, bounds.upper);
                if c != v {
                    clamped += 1;
                }
                Value::Float(c)
            }
            None => Value::Missing,
        })
        .collect();

    tracing::debug!(
        column,
        floor = bounds.lower,
        cap = bounds.upper,
        clamped,
        "Capped outliers"
    );
    dataset.with_column(column, capped.with_capped_at(bounds))
}
