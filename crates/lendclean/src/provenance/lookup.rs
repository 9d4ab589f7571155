//! Deduplicated change log between a snapshot and a transformed dataset.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{LendcleanError, Result};
use crate::table::{Dataset, Value};
use crate::transform::grade::{GradeMode, bucket_grade};

/// Shown as the original value when the source cell was absent.
pub const MISSING_DISPLAY: &str = "missing";

/// One audit row: a distinct original value of a column and what it became.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRecord {
    #[serde(rename = "Column")]
    pub column: String,
    #[serde(rename = "Original")]
    pub original: String,
    #[serde(rename = "Imputed")]
    pub imputed: String,
}

impl LookupRecord {
    pub fn new(
        column: impl Into<String>,
        original: impl Into<String>,
        imputed: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            original: original.into(),
            imputed: imputed.into(),
        }
    }
}

/// Lookup records in first-seen order, at most one per (column, original).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    records: Vec<LookupRecord>,
}

impl LookupTable {
    pub fn records(&self) -> &[LookupRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LookupRecord> {
        self.records.iter()
    }

    /// The record for a column's original value, if one was emitted.
    pub fn find(&self, column: &str, original: &str) -> Option<&LookupRecord> {
        self.records
            .iter()
            .find(|r| r.column == column && r.original == original)
    }

    /// Number of records per column, in first-seen column order.
    pub fn column_counts(&self) -> IndexMap<&str, usize> {
        let mut counts = IndexMap::new();
        for record in &self.records {
            *counts.entry(record.column.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Per-column special cases applied while diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRules {
    /// Columns filled with a group median; filled values are tagged `(median)`.
    pub median_columns: Vec<String>,
    /// Columns filled with a group mode; filled values are tagged `(mode)`.
    pub mode_columns: Vec<String>,
    /// Numeric grade column that always gets a grade-to-letter record.
    pub grade_column: Option<String>,
}

impl Default for LookupRules {
    fn default() -> Self {
        Self {
            median_columns: vec!["int_rate".to_string()],
            mode_columns: vec!["emp_title".to_string(), "emp_length".to_string()],
            grade_column: Some("grade".to_string()),
        }
    }
}

impl LookupRules {
    fn annotate(&self, column: &str, imputed: &Value) -> String {
        if self.median_columns.iter().any(|c| c == column) {
            format!("{} (median)", imputed)
        } else if self.mode_columns.iter().any(|c| c == column) {
            format!("{} (mode)", imputed)
        } else {
            imputed.to_string()
        }
    }

    fn is_grade(&self, column: &str) -> bool {
        self.grade_column.as_deref() == Some(column)
    }
}

fn display_original(value: &Value) -> String {
    if value.is_missing() {
        MISSING_DISPLAY.to_string()
    } else {
        value.to_string()
    }
}

/// Compare every snapshot column with the same column of `transformed`.
///
/// Rows are paired by position, so both datasets must keep the same row
/// order. For each column, the first row with a given original value
/// decides its record; later rows with that original value are skipped
/// even if they ended up with something else.
pub fn build_lookup(
    snapshot: &Dataset,
    transformed: &Dataset,
    rules: &LookupRules,
) -> Result<LookupTable> {
    if snapshot.row_count() != transformed.row_count() {
        return Err(LendcleanError::LengthMismatch {
            column: "<rows>".to_string(),
            expected: snapshot.row_count(),
            actual: transformed.row_count(),
        });
    }

    let mut records = Vec::new();
    for (name, original) in snapshot.columns() {
        let current = transformed.column(name)?;
        let mut seen: HashSet<String> = HashSet::new();

        for (before, after) in original.iter().zip(current.iter()) {
            if before != after {
                let shown = display_original(before);
                let imputed = if before.is_missing() {
                    rules.annotate(name, after)
                } else {
                    after.to_string()
                };
                if seen.insert(shown.clone()) {
                    records.push(LookupRecord::new(name, shown, imputed));
                }
            }

            if rules.is_grade(name) {
                let shown = display_original(before);
                if seen.insert(shown.clone()) {
                    let letter = bucket_grade(after, GradeMode::Passthrough);
                    records.push(LookupRecord::new(name, shown, letter.to_string()));
                }
            }
        }
    }

    tracing::info!(records = records.len(), "Built lookup table");
    Ok(LookupTable { records })
}
