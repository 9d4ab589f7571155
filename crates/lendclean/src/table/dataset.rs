//! The in-memory table every pipeline stage consumes and produces.

use indexmap::IndexMap;

use crate::error::{LendcleanError, Result};

use super::column::Column;
use super::value::Value;

/// The named row key of a dataset (e.g. a customer identifier).
#[derive(Debug, Clone, PartialEq)]
pub struct RowIndex {
    pub name: String,
    pub keys: Vec<Value>,
}

/// Ordered named columns over a shared row index.
///
/// Every column has exactly [`Dataset::row_count`] values. Stages take a
/// dataset by value and return the transformed one, so a clone taken
/// before a stage is an untouched snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    index: Option<RowIndex>,
    columns: IndexMap<String, Column>,
    row_count: usize,
}

impl Dataset {
    /// Create an empty dataset with a fixed row count.
    pub fn with_rows(row_count: usize) -> Self {
        Self {
            index: None,
            columns: IndexMap::new(),
            row_count,
        }
    }

    /// Build a typed dataset from string rows (row-major order).
    pub fn from_rows(headers: Vec<String>, rows: &[Vec<String>]) -> Result<Self> {
        let mut dataset = Self::with_rows(rows.len());
        for (i, header) in headers.into_iter().enumerate() {
            let cells: Vec<&str> = rows
                .iter()
                .map(|row| row.get(i).map(String::as_str).unwrap_or(""))
                .collect();
            if dataset.columns.contains_key(&header) {
                return Err(LendcleanError::DuplicateColumn(header));
            }
            dataset = dataset.with_column(header, Column::infer(&cells))?;
        }
        Ok(dataset)
    }

    /// Build a dataset from named columns, in order.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut iter = columns.into_iter().peekable();
        let rows = iter.peek().map(|(_, c)| c.len()).unwrap_or(0);
        let mut dataset = Self::with_rows(rows);
        for (name, column) in iter {
            let name = name.into();
            if dataset.columns.contains_key(&name) {
                return Err(LendcleanError::DuplicateColumn(name));
            }
            dataset = dataset.with_column(name, column)?;
        }
        Ok(dataset)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| LendcleanError::ColumnNotFound(name.to_string()))
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn index(&self) -> Option<&RowIndex> {
        self.index.as_ref()
    }

    /// Insert a column, replacing any column of the same name in place.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if column.len() != self.row_count {
            return Err(LendcleanError::LengthMismatch {
                column: name,
                expected: self.row_count,
                actual: column.len(),
            });
        }
        self.columns.insert(name, column);
        Ok(self)
    }

    /// Remove a column, preserving the order of the rest.
    pub fn without_column(mut self, name: &str) -> Result<Self> {
        self.columns
            .shift_remove(name)
            .ok_or_else(|| LendcleanError::ColumnNotFound(name.to_string()))?;
        Ok(self)
    }

    /// Replace every value of a column with `f(value)`.
    pub fn map_column<F>(self, name: &str, f: F) -> Result<Self>
    where
        F: FnMut(&Value) -> Value,
    {
        let mapped: Column = self.column(name)?.iter().map(f).collect();
        self.with_column(name.to_string(), mapped)
    }

    /// Rename every column with `f`, keeping order.
    pub fn rename_columns<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(&str) -> String,
    {
        let mut renamed = IndexMap::with_capacity(self.columns.len());
        for (name, column) in self.columns {
            let new_name = f(&name);
            if renamed.contains_key(&new_name) {
                return Err(LendcleanError::DuplicateColumn(new_name));
            }
            renamed.insert(new_name, column);
        }
        Ok(Self {
            index: self.index,
            columns: renamed,
            row_count: self.row_count,
        })
    }

    /// Move a column out of the data and make it the row index.
    ///
    /// Uniqueness of the keys is the caller's responsibility.
    pub fn with_index(mut self, name: &str) -> Result<Self> {
        let column = self
            .columns
            .shift_remove(name)
            .ok_or_else(|| LendcleanError::ColumnNotFound(name.to_string()))?;
        self.index = Some(RowIndex {
            name: name.to_string(),
            keys: column.into_values(),
        });
        Ok(self)
    }

    /// Header row for export: the index name (if any) then column names.
    pub fn headers(&self) -> Vec<String> {
        self.index
            .iter()
            .map(|i| i.name.clone())
            .chain(self.columns.keys().cloned())
            .collect()
    }

    /// Display form of one row, index first, aligned with [`Dataset::headers`].
    pub fn record(&self, row: usize) -> Vec<String> {
        let key = self
            .index
            .as_ref()
            .map(|i| i.keys.get(row).map(ToString::to_string).unwrap_or_default());
        key.into_iter()
            .chain(self.columns.values().map(|c| {
                c.get(row).map(ToString::to_string).unwrap_or_default()
            }))
            .collect()
    }
}
