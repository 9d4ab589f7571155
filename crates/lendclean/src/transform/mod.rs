//! Column transforms. Each takes a dataset by value and returns the result.

pub mod features;
pub mod grade;
pub mod impute;
pub mod onehot;
pub mod ordinal;
pub mod outliers;
pub mod scale;
pub mod schema;
pub mod stats;

pub use features::{InstallmentInputs, monthly_installment};
pub use grade::{GradeMode, bucket_grade};
pub use impute::{Aggregate, Fallback, GroupImpute, GroupStatistic, IncomeBracket};
pub use onehot::TopCategorySet;
pub use ordinal::{
    HomeOwnership, LetterGrade, LoanStatus, OrdinalScale, VerificationStatus, encode_ordinal,
};
pub use outliers::cap_outliers;
pub use scale::min_max_scale;
pub use schema::{normalize_column_name, normalize_schema};
