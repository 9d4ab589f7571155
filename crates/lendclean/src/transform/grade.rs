//! Numeric sub-grade (1..=35) to letter grade bucketing.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::{Dataset, Value};

use super::ordinal::{LetterGrade, OrdinalScale};

/// What to do with a grade outside `1..=35`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeMode {
    /// Out-of-range grades become [`Value::Unmapped`].
    Strict,
    /// Out-of-range grades are returned unchanged.
    Passthrough,
}

impl LetterGrade {
    /// Bucket a numeric grade into 5-wide bins: 1-5 is A, ..., 31-35 is G.
    pub fn from_grade(grade: i64) -> Option<Self> {
        if !(1..=35).contains(&grade) {
            return None;
        }
        Self::LEVELS.get(((grade - 1) / 5) as usize).copied()
    }
}

/// Map one grade value to its letter under `mode`.
///
/// Missing stays missing in both modes.
pub fn bucket_grade(value: &Value, mode: GradeMode) -> Value {
    if value.is_missing() {
        return Value::Missing;
    }
    match value.as_i64().and_then(LetterGrade::from_grade) {
        Some(letter) => Value::text(letter.label()),
        None => match mode {
            GradeMode::Strict => Value::Unmapped,
            GradeMode::Passthrough => value.clone(),
        },
    }
}

/// Add (or replace) `target` with the strict letter bucket of `source`.
pub fn derive_letter_grade(dataset: Dataset, source: &str, target: &str) -> Result<Dataset> {
    let letters = dataset
        .column(source)?
        .iter()
        .map(|v| bucket_grade(v, GradeMode::Strict))
        .collect();
    dataset.with_column(target, letters)
}
