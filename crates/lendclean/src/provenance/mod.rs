//! Audit trail of values changed by the pipeline.

mod lookup;

pub use lookup::{LookupRecord, LookupRules, LookupTable, MISSING_DISPLAY, build_lookup};
