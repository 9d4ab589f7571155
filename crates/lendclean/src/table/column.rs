//! Column storage and type inference.

use serde::{Deserialize, Serialize};

use crate::error::{LendcleanError, Result};

use super::value::Value;

/// Semantic type of a column, inferred from its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    /// Values of more than one kind, e.g. text plus an unmapped marker.
    Mixed,
    /// No observed values at all.
    Empty,
}

/// Lower and upper clamp bounds recorded when a column is capped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampBounds {
    pub lower: f64,
    pub upper: f64,
}

/// A sequence of values sharing one name in a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    values: Vec<Value>,
    capped_at: Option<ClampBounds>,
}

impl Column {
    /// Create a column from values.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            capped_at: None,
        }
    }

    /// Build a typed column from raw cells.
    ///
    /// NA tokens become [`Value::Missing`]. If every other cell parses as an
    /// integer the column is integer-typed, else if every cell parses as a
    /// float it is float-typed, otherwise all cells are kept as text.
    pub fn infer<S: AsRef<str>>(raw: &[S]) -> Self {
        let observed = raw
            .iter()
            .map(AsRef::as_ref)
            .filter(|s| !Value::is_na_token(s));

        let mut all_int = true;
        let mut all_float = true;
        for cell in observed {
            let cell = cell.trim();
            if all_int && cell.parse::<i64>().is_err() {
                all_int = false;
            }
            if cell.parse::<f64>().is_err() {
                all_float = false;
                break;
            }
        }

        let values = raw
            .iter()
            .map(|cell| {
                let cell = cell.as_ref();
                if Value::is_na_token(cell) {
                    return Value::Missing;
                }
                let trimmed = cell.trim();
                if all_int {
                    trimmed.parse().map(Value::Int).unwrap_or(Value::Missing)
                } else if all_float {
                    trimmed.parse().map(Value::Float).unwrap_or(Value::Missing)
                } else {
                    Value::Text(cell.to_string())
                }
            })
            .collect();

        Self::new(values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Values that are not missing.
    pub fn observed(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Bounds this column was last capped to, if any.
    pub fn capped_at(&self) -> Option<ClampBounds> {
        self.capped_at
    }

    pub(crate) fn with_capped_at(mut self, bounds: ClampBounds) -> Self {
        self.capped_at = Some(bounds);
        self
    }

    /// Infer the column's kind from its observed values.
    pub fn kind(&self) -> ColumnKind {
        let mut kind: Option<ColumnKind> = None;
        for value in self.observed() {
            let this = match value {
                Value::Int(_) => ColumnKind::Integer,
                Value::Float(_) => ColumnKind::Float,
                Value::Text(_) => ColumnKind::Text,
                Value::Bool(_) => ColumnKind::Boolean,
                Value::Date(_) => ColumnKind::Date,
                Value::Unmapped | Value::Missing => ColumnKind::Mixed,
            };
            kind = Some(match (kind, this) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnKind::Integer), ColumnKind::Float)
                | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
                _ => return ColumnKind::Mixed,
            });
        }
        kind.unwrap_or(ColumnKind::Empty)
    }

    /// Numeric view of every row; missing rows are `None`.
    ///
    /// Fails on the first value that is present but not numeric.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.values
            .iter()
            .enumerate()
            .map(|(row, value)| match value {
                Value::Missing => Ok(None),
                Value::Float(f) if f.is_nan() => Ok(None),
                v => v.as_f64().map(Some).ok_or_else(|| LendcleanError::NotNumeric {
                    column: name.to_string(),
                    row,
                    value: v.to_string(),
                }),
            })
            .collect()
    }
}

impl FromIterator<Value> for Column {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_integer_column() {
        let col = Column::infer(&["1", "", "35"]);
        assert_eq!(col.kind(), ColumnKind::Integer);
        assert_eq!(col.values(), &[Value::Int(1), Value::Missing, Value::Int(35)]);
    }

    #[test]
    fn test_infer_float_column() {
        let col = Column::infer(&["0.12", "7", "NaN"]);
        assert_eq!(col.kind(), ColumnKind::Float);
        assert_eq!(col.missing_count(), 1);
    }

    #[test]
    fn test_infer_text_keeps_none_category() {
        let col = Column::infer(&["RENT", "NONE", "None"]);
        assert_eq!(col.kind(), ColumnKind::Text);
        assert_eq!(col.get(1), Some(&Value::text("NONE")));
        assert_eq!(col.get(2), Some(&Value::Missing));
    }

    #[test]
    fn test_numeric_view_rejects_text() {
        let col = Column::new(vec![Value::Int(1), Value::text("x")]);
        let err = col.numeric("amount").unwrap_err();
        assert!(matches!(err, LendcleanError::NotNumeric { row: 1, .. }));
    }

    #[test]
    fn test_empty_kind() {
        let col = Column::new(vec![Value::Missing, Value::Missing]);
        assert_eq!(col.kind(), ColumnKind::Empty);
    }
}
