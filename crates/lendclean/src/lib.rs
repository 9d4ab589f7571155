//! Lendclean: cleaning and audit pipeline for loan-origination data.
//!
//! Lendclean reads a raw loan extract, repairs missing and inconsistent
//! values, derives analytic features, and writes two files: the cleaned
//! dataset and a lookup table recording which original values were changed
//! into what.
//!
//! # Core Principles
//!
//! - **Owned stages**: every transform takes a dataset by value and returns
//!   the result, so the pre-transform snapshot is never touched
//! - **Explicit markers**: values outside an encoding table become
//!   `unmapped` instead of disappearing
//! - **Auditable**: each distinct repaired or encoded value gets one lookup record
//!
//! # Example
//!
//! ```no_run
//! use lendclean::{Lendclean, LendcleanConfig};
//!
//! let config = LendcleanConfig::load("lendclean.json").unwrap();
//! let summary = Lendclean::with_config(config).run().unwrap();
//!
//! println!("Mode: {:?}", summary.mode);
//! println!("Lookup records: {:?}", summary.lookup_records);
//! ```

pub mod error;
pub mod input;
pub mod persist;
pub mod pipeline;
pub mod provenance;
pub mod reference;
pub mod table;
pub mod transform;

mod lendclean;

pub use crate::lendclean::{
    DATABASE_URL_ENV, Lendclean, LendcleanConfig, ReferenceConfig, RunMode, RunSummary,
    StoreConfig, TableUpload,
};
pub use error::{LendcleanError, Result};
pub use input::{Parser, SourceMetadata};
pub use persist::{DirectoryStore, TableStore, UploadOutcome};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
pub use provenance::{LookupRecord, LookupTable};
pub use reference::{StateNameResolver, StaticStateNames};
pub use table::{Column, Dataset, Value};
