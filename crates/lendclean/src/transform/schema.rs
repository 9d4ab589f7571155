//! Column-name normalization, row indexing, and light text tidying.

use crate::error::Result;
use crate::table::{Dataset, Value};

/// Canonical form of a column name: spaces become underscores, then lower-case.
pub fn normalize_column_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Normalize every column name and make `index_column` the row index.
///
/// `index_column` is looked up after normalization. Its values must be
/// unique; that is not checked here.
pub fn normalize_schema(dataset: Dataset, index_column: &str) -> Result<Dataset> {
    let dataset = dataset.rename_columns(normalize_column_name)?;
    let dataset = dataset.with_index(index_column)?;
    tracing::debug!(
        index = index_column,
        columns = dataset.column_count(),
        "Normalized schema"
    );
    Ok(dataset)
}

/// Drop each named column.
pub fn drop_columns<S: AsRef<str>>(dataset: Dataset, columns: &[S]) -> Result<Dataset> {
    columns
        .iter()
        .try_fold(dataset, |ds, name| ds.without_column(name.as_ref()))
}

/// Lower-case every text value of a column.
pub fn lowercase_text(dataset: Dataset, column: &str) -> Result<Dataset> {
    dataset.map_column(column, |value| match value {
        Value::Text(s) => Value::Text(s.to_lowercase()),
        other => other.clone(),
    })
}

/// Replace exact text matches of `from` with `to` in a column.
pub fn replace_text(dataset: Dataset, column: &str, from: &str, to: &str) -> Result<Dataset> {
    dataset.map_column(column, |value| match value {
        Value::Text(s) if s == from => Value::text(to),
        other => other.clone(),
    })
}
