//! Table stores that the written CSV files are uploaded into.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LendcleanError, Result};
use crate::input::Parser;

/// A destination that can hold named tables created from CSV files.
pub trait TableStore {
    /// Whether a table called `name` already exists.
    fn table_exists(&mut self, name: &str) -> Result<bool>;

    /// Create table `name` from the CSV file at `path`.
    ///
    /// Fails with [`LendcleanError::TableExists`] when the table is already there.
    fn create_table_from_file(&mut self, path: &Path, name: &str) -> Result<()>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Stores each table as `<root>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.csv", name))
    }
}

impl TableStore for DirectoryStore {
    fn table_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self.table_path(name).exists())
    }

    fn create_table_from_file(&mut self, path: &Path, name: &str) -> Result<()> {
        if self.table_exists(name)? {
            return Err(LendcleanError::TableExists(name.to_string()));
        }

        // Refuse files that would not load back as a table.
        Parser::new().parse_file(path)?;

        fs::create_dir_all(&self.root).map_err(|e| LendcleanError::io(&self.root, e))?;
        let target = self.table_path(name);
        fs::copy(path, &target).map_err(|e| LendcleanError::io(&target, e))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// What happened to one table during upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum UploadOutcome {
    Created,
    AlreadyExists,
    Failed(String),
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Created => write!(f, "created"),
            UploadOutcome::AlreadyExists => write!(f, "already exists"),
            UploadOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Upload each `(file, table name)` pair, continuing past failures.
pub fn upload_tables(
    store: &mut dyn TableStore,
    tables: &[(&Path, &str)],
) -> Vec<(String, UploadOutcome)> {
    let target = store.describe();
    tables
        .iter()
        .map(|(path, name)| {
            let outcome = match store.create_table_from_file(path, name) {
                Ok(()) => {
                    tracing::info!(table = *name, store = %target, "Created table");
                    UploadOutcome::Created
                }
                Err(LendcleanError::TableExists(_)) => {
                    tracing::warn!(table = *name, store = %target, "Table already exists");
                    UploadOutcome::AlreadyExists
                }
                Err(e) => {
                    tracing::error!(table = *name, store = %target, error = %e, "Table upload failed");
                    UploadOutcome::Failed(e.to_string())
                }
            };
            (name.to_string(), outcome)
        })
        .collect()
}
