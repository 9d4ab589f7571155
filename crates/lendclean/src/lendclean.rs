//! Main Lendclean struct: configuration and the run-once control flow.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LendcleanError, Result};
use crate::input::{Parser, ParserConfig, SourceMetadata};
#[cfg(feature = "postgres")]
use crate::persist::PostgresStore;
use crate::persist::{
    DirectoryStore, TableStore, UploadOutcome, upload_tables, write_lookup, write_table,
};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::reference::{
    CachedStateNames, DEFAULT_STATES_URL, StateNameResolver, StaticStateNames, WebStateNames,
    resolve_or_static,
};

/// Environment variable that overrides the postgres connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

fn default_states_url() -> String {
    DEFAULT_STATES_URL.to_string()
}

fn default_reference_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

/// Where state names come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceConfig {
    /// Built-in table only.
    Static,
    /// Scrape the classification page, falling back to the built-in table.
    Web {
        #[serde(default = "default_states_url")]
        url: String,
        #[serde(default = "default_reference_timeout")]
        timeout_secs: u64,
    },
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        ReferenceConfig::Web {
            url: default_states_url(),
            timeout_secs: default_reference_timeout(),
        }
    }
}

/// Where the written tables are uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// A directory of CSV tables; defaults to `<output_dir>/db`.
    Directory {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// A PostgreSQL database (needs the `postgres` feature).
    Postgres {
        url: String,
        #[serde(default = "default_connect_timeout")]
        connect_timeout_secs: u64,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Directory { path: None }
    }
}

/// Configuration for a Lendclean run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendcleanConfig {
    /// Raw loan file.
    pub input: PathBuf,
    /// Directory the cleaned and lookup files are written to.
    pub output_dir: PathBuf,
    /// Table name of the cleaned dataset; the file is `<output_dir>/<name>.csv`.
    pub cleaned_table: String,
    /// Table name of the lookup table; the file is `<output_dir>/<name>.csv`.
    pub lookup_table: String,
    pub pipeline: PipelineConfig,
    pub reference: ReferenceConfig,
    pub store: StoreConfig,
}

impl Default for LendcleanConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/fintech_data.csv"),
            output_dir: PathBuf::from("data"),
            cleaned_table: "fintech_data_clean".to_string(),
            lookup_table: "fintech_data_lookup_table".to_string(),
            pipeline: PipelineConfig::default(),
            reference: ReferenceConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl LendcleanConfig {
    /// Load a JSON configuration file. Absent fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| LendcleanError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            LendcleanError::Config(format!("Invalid config '{}': {}", path.display(), e))
        })?;
        Ok(config)
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.cleaned_table))
    }

    pub fn lookup_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.lookup_table))
    }
}

/// Which path a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// The raw file was cleaned and both files written.
    Transformed,
    /// The cleaned file already existed; only the upload ran.
    UploadOnly,
}

/// Upload result for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableUpload {
    pub table: String,
    pub outcome: UploadOutcome,
}

/// What a run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: RunMode,
    /// Metadata of the raw file, when it was read.
    pub source: Option<SourceMetadata>,
    pub cleaned_path: PathBuf,
    pub lookup_path: PathBuf,
    /// Rows in the cleaned dataset (transformed runs only).
    pub rows: Option<usize>,
    /// Columns in the cleaned dataset, excluding the index.
    pub columns: Option<usize>,
    /// Lookup records written.
    pub lookup_records: Option<usize>,
    /// Per-table upload outcomes; empty if the store could not be opened.
    pub uploads: Vec<TableUpload>,
}

/// The main Lendclean engine.
pub struct Lendclean {
    config: LendcleanConfig,
    parser: Parser,
    pipeline: Pipeline,
    resolver: Box<dyn StateNameResolver>,
    store: Option<Box<dyn TableStore>>,
}

fn resolver_for(reference: &ReferenceConfig) -> Box<dyn StateNameResolver> {
    match reference {
        ReferenceConfig::Static => Box::new(StaticStateNames),
        ReferenceConfig::Web { url, timeout_secs } => {
            match WebStateNames::new(url.clone(), Duration::from_secs(*timeout_secs)) {
                Ok(web) => Box::new(CachedStateNames::new(web)),
                Err(e) => {
                    tracing::warn!(error = %e, "Web reference unavailable; using built-in table");
                    Box::new(StaticStateNames)
                }
            }
        }
    }
}

impl Lendclean {
    /// Create a Lendclean instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(LendcleanConfig::default())
    }

    /// Create a Lendclean instance with custom configuration.
    pub fn with_config(config: LendcleanConfig) -> Self {
        let parser = Parser::with_config(ParserConfig::default());
        let pipeline = Pipeline::with_config(config.pipeline.clone());
        let resolver = resolver_for(&config.reference);

        Self {
            config,
            parser,
            pipeline,
            resolver,
            store: None,
        }
    }

    /// Use `resolver` for state names instead of the configured source.
    pub fn with_resolver(mut self, resolver: impl StateNameResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Upload into `store` instead of the configured one.
    pub fn with_store(mut self, store: impl TableStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn config(&self) -> &LendcleanConfig {
        &self.config
    }

    /// Clean the raw file unless the cleaned file already exists, then upload.
    ///
    /// Failures while cleaning or writing abort the run; upload failures are
    /// logged and reported in the summary.
    pub fn run(&mut self) -> Result<RunSummary> {
        let cleaned_path = self.config.cleaned_path();
        let lookup_path = self.config.lookup_path();

        let mut summary = if cleaned_path.exists() {
            tracing::info!(
                path = %cleaned_path.display(),
                "Cleaned dataset exists; uploading only"
            );
            RunSummary {
                mode: RunMode::UploadOnly,
                source: None,
                cleaned_path,
                lookup_path,
                rows: None,
                columns: None,
                lookup_records: None,
                uploads: Vec::new(),
            }
        } else {
            tracing::info!(input = %self.config.input.display(), "Cleaned dataset not found; preparing data");
            self.transform(cleaned_path, lookup_path)?
        };

        summary.uploads = self.upload(&summary.cleaned_path, &summary.lookup_path);
        Ok(summary)
    }

    fn transform(&self, cleaned_path: PathBuf, lookup_path: PathBuf) -> Result<RunSummary> {
        let (raw, source) = self.parser.parse_file(&self.config.input)?;
        let state_names = resolve_or_static(self.resolver.as_ref());
        let output = self.pipeline.run(raw, Some(&state_names))?;

        write_lookup(&output.lookup, &lookup_path)?;

        // The cleaned file is the re-run signal, so it only appears once complete.
        let partial = cleaned_path.with_extension("csv.partial");
        write_table(&output.cleaned, &partial)?;
        fs::rename(&partial, &cleaned_path).map_err(|e| LendcleanError::io(&cleaned_path, e))?;

        Ok(RunSummary {
            mode: RunMode::Transformed,
            source: Some(source),
            cleaned_path,
            lookup_path,
            rows: Some(output.cleaned.row_count()),
            columns: Some(output.cleaned.column_count()),
            lookup_records: Some(output.lookup.len()),
            uploads: Vec::new(),
        })
    }

    fn open_store(&self) -> Result<Box<dyn TableStore>> {
        match &self.config.store {
            StoreConfig::Directory { path } => {
                let root = path
                    .clone()
                    .unwrap_or_else(|| self.config.output_dir.join("db"));
                Ok(Box::new(DirectoryStore::new(root)))
            }
            #[cfg(feature = "postgres")]
            StoreConfig::Postgres {
                url,
                connect_timeout_secs,
            } => {
                let url = std::env::var(DATABASE_URL_ENV).unwrap_or_else(|_| url.clone());
                let store =
                    PostgresStore::connect(&url, Duration::from_secs(*connect_timeout_secs))?;
                Ok(Box::new(store))
            }
            #[cfg(not(feature = "postgres"))]
            StoreConfig::Postgres { .. } => Err(LendcleanError::Config(
                "postgres store requires the 'postgres' feature".to_string(),
            )),
        }
    }

    fn upload(&mut self, cleaned_path: &Path, lookup_path: &Path) -> Vec<TableUpload> {
        if self.store.is_none() {
            match self.open_store() {
                Ok(store) => self.store = Some(store),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to store; upload skipped");
                    return Vec::new();
                }
            }
        }
        let Some(store) = self.store.as_deref_mut() else {
            return Vec::new();
        };

        let tables = [
            (cleaned_path, self.config.cleaned_table.as_str()),
            (lookup_path, self.config.lookup_table.as_str()),
        ];
        upload_tables(store, &tables)
            .into_iter()
            .map(|(table, outcome)| TableUpload { table, outcome })
            .collect()
    }
}

impl Default for Lendclean {
    fn default() -> Self {
        Self::new()
    }
}
