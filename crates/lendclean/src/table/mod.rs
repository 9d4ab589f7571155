//! Tabular data model shared by every pipeline stage.

mod column;
mod dataset;
mod value;

pub use column::{ClampBounds, Column, ColumnKind};
pub use dataset::{Dataset, RowIndex};
pub use value::Value;
