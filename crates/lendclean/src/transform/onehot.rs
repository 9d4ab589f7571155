//! One-hot indicators for the most frequent categories of a column.

use crate::error::Result;
use crate::table::{Column, Dataset, Value};

use super::stats;

/// The `n` most frequent distinct values of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct TopCategorySet {
    pub column: String,
    pub labels: Vec<Value>,
}

impl TopCategorySet {
    /// Most frequent first; equal counts keep first-seen order. Missing is never a category.
    pub fn compute(dataset: &Dataset, column: &str, n: usize) -> Result<Self> {
        let labels = stats::top_n(dataset.column(column)?.iter(), n);
        Ok(Self {
            column: column.to_string(),
            labels,
        })
    }

    /// Name of the indicator column for `label`.
    pub fn indicator_name(&self, label: &Value) -> String {
        format!("{}_{}", self.column, label)
    }
}

/// Append one 0/1 indicator column per label in `top`.
///
/// Rows whose value is outside the set get 0 in every indicator.
pub fn one_hot_encode(dataset: Dataset, top: &TopCategorySet) -> Result<Dataset> {
    let mut dataset = dataset;
    for label in &top.labels {
        let indicator: Column = dataset
            .column(&top.column)?
            .iter()
            .map(|value| Value::Int(i64::from(value == label)))
            .collect();
        dataset = dataset.with_column(top.indicator_name(label), indicator)?;
    }
    Ok(dataset)
}

/// Compute the top `n` categories of `column` and encode them.
pub fn one_hot_top_n(dataset: Dataset, column: &str, n: usize) -> Result<Dataset> {
    let top = TopCategorySet::compute(&dataset, column, n)?;
    tracing::debug!(
        column,
        labels = ?top.labels.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "One-hot encoding top categories"
    );
    one_hot_encode(dataset, &top)
}
