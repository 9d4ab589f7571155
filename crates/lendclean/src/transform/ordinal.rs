//! Ordinal encodings over fixed, closed categorical domains.
//!
//! Each domain is an enum whose discriminant is its rank. Labels outside the
//! domain encode to [`Value::Unmapped`] so the change log can surface them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::{Dataset, Value};

/// A closed categorical domain with an integer rank per level.
pub trait OrdinalScale: Sized + Copy + 'static {
    /// Every level, highest rank first.
    const LEVELS: &'static [Self];

    /// Label as it appears in the raw data.
    fn label(self) -> &'static str;

    fn rank(self) -> i64;

    fn from_label(label: &str) -> Option<Self> {
        Self::LEVELS.iter().copied().find(|level| level.label() == label)
    }
}

/// Loan repayment status, ranked by severity (`Fully Paid` is best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    FullyPaid = 6,
    Current = 5,
    InGracePeriod = 4,
    Late16To30 = 3,
    Late31To120 = 2,
    ChargedOff = 1,
    Default = 0,
}

impl OrdinalScale for LoanStatus {
    const LEVELS: &'static [Self] = &[
        LoanStatus::FullyPaid,
        LoanStatus::Current,
        LoanStatus::InGracePeriod,
        LoanStatus::Late16To30,
        LoanStatus::Late31To120,
        LoanStatus::ChargedOff,
        LoanStatus::Default,
    ];

    fn label(self) -> &'static str {
        match self {
            LoanStatus::FullyPaid => "Fully Paid",
            LoanStatus::Current => "Current",
            LoanStatus::InGracePeriod => "In Grace Period",
            LoanStatus::Late16To30 => "Late (16-30 days)",
            LoanStatus::Late31To120 => "Late (31-120 days)",
            LoanStatus::ChargedOff => "Charged Off",
            LoanStatus::Default => "Default",
        }
    }

    fn rank(self) -> i64 {
        self as i64
    }
}

/// Letter grade bucket; `A` is the best credit grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    A = 6,
    B = 5,
    C = 4,
    D = 3,
    E = 2,
    F = 1,
    G = 0,
}

impl OrdinalScale for LetterGrade {
    const LEVELS: &'static [Self] = &[
        LetterGrade::A,
        LetterGrade::B,
        LetterGrade::C,
        LetterGrade::D,
        LetterGrade::E,
        LetterGrade::F,
        LetterGrade::G,
    ];

    fn label(self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::E => "E",
            LetterGrade::F => "F",
            LetterGrade::G => "G",
        }
    }

    fn rank(self) -> i64 {
        self as i64
    }
}

/// How far the borrower's income was verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    Verified = 2,
    SourceVerified = 1,
    NotVerified = 0,
}

impl OrdinalScale for VerificationStatus {
    const LEVELS: &'static [Self] = &[
        VerificationStatus::Verified,
        VerificationStatus::SourceVerified,
        VerificationStatus::NotVerified,
    ];

    fn label(self) -> &'static str {
        match self {
            VerificationStatus::Verified => "Verified",
            VerificationStatus::SourceVerified => "Source Verified",
            VerificationStatus::NotVerified => "Not Verified",
        }
    }

    fn rank(self) -> i64 {
        self as i64
    }
}

/// Home ownership, ranked by housing stability. `ANY`/`NONE` rank lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomeOwnership {
    Own = 4,
    Mortgage = 3,
    Rent = 2,
    Any = 1,
    None = 0,
}

impl OrdinalScale for HomeOwnership {
    const LEVELS: &'static [Self] = &[
        HomeOwnership::Own,
        HomeOwnership::Mortgage,
        HomeOwnership::Rent,
        HomeOwnership::Any,
        HomeOwnership::None,
    ];

    fn label(self) -> &'static str {
        match self {
            HomeOwnership::Own => "OWN",
            HomeOwnership::Mortgage => "MORTGAGE",
            HomeOwnership::Rent => "RENT",
            HomeOwnership::Any => "ANY",
            HomeOwnership::None => "NONE",
        }
    }

    fn rank(self) -> i64 {
        self as i64
    }
}

/// Encode a single value. Missing stays missing.
pub fn encode_value<S: OrdinalScale>(value: &Value) -> Value {
    match value {
        Value::Missing => Value::Missing,
        Value::Text(label) => S::from_label(label).map_or(Value::Unmapped, |s| Value::Int(s.rank())),
        other => S::from_label(&other.to_string()).map_or(Value::Unmapped, |s| Value::Int(s.rank())),
    }
}

/// Replace each label in `column` with its rank under `S`.
pub fn encode_ordinal<S: OrdinalScale>(dataset: Dataset, column: &str) -> Result<Dataset> {
    let mut unmapped = 0usize;
    let dataset = dataset.map_column(column, |value| {
        let encoded = encode_value::<S>(value);
        if matches!(encoded, Value::Unmapped) {
            unmapped += 1;
        }
        encoded
    })?;

    if unmapped > 0 {
        tracing::warn!(column, unmapped, "Values outside the encoding table");
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn test_loan_status_ranks() {
        assert_eq!(LoanStatus::from_label("Fully Paid").map(|s| s.rank()), Some(6));
        assert_eq!(LoanStatus::from_label("Late (31-120 days)").map(|s| s.rank()), Some(2));
        assert_eq!(LoanStatus::from_label("Default").map(|s| s.rank()), Some(0));
        assert_eq!(LoanStatus::from_label("fully paid"), None);
    }

    #[test]
    fn test_levels_are_strictly_descending() {
        fn check<S: OrdinalScale>() {
            let ranks: Vec<i64> = S::LEVELS.iter().map(|l| l.rank()).collect();
            assert!(ranks.windows(2).all(|w| w[0] > w[1]));
            assert_eq!(*ranks.last().unwrap(), 0);
        }
        check::<LoanStatus>();
        check::<LetterGrade>();
        check::<VerificationStatus>();
        check::<HomeOwnership>();
    }

    #[test]
    fn test_home_ownership_none_is_a_level() {
        assert_eq!(encode_value::<HomeOwnership>(&Value::text("NONE")), Value::Int(0));
        assert_eq!(encode_value::<HomeOwnership>(&Value::text("OTHER")), Value::Unmapped);
        assert_eq!(encode_value::<HomeOwnership>(&Value::Missing), Value::Missing);
    }

    #[test]
    fn test_encode_column() {
        let ds = Dataset::from_columns([(
            "verification_status",
            Column::new(vec![
                Value::text("Verified"),
                Value::text("Not Verified"),
                Value::text("Pending"),
            ]),
        )])
        .unwrap();
        let ds = encode_ordinal::<VerificationStatus>(ds, "verification_status").unwrap();
        assert_eq!(
            ds.column("verification_status").unwrap().values(),
            &[Value::Int(2), Value::Int(0), Value::Unmapped]
        );
    }
}
