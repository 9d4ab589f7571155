//! The fixed sequence of cleaning stages.
//!
//! A run goes through three phases:
//!
//! 1. **prepare**: rename, index, drop duplicate columns, tidy `type`, derive
//!    `letter_grade`. The result is the snapshot the lookup table is diffed
//!    against.
//! 2. **repair**: impute missing values and apply the ordinal encodings. The
//!    lookup table is built from the snapshot and this result.
//! 3. **reshape**: cap outliers, derive features, one-hot encode, scale, and
//!    attach state names.
//!
//! The raw extract must carry the index column and every column in
//! [`REQUIRED_COLUMNS`]; anything else fails before the snapshot is taken.
//! Configured outlier, one-hot and scale columns that are absent are skipped.

use serde::{Deserialize, Serialize};

use crate::error::{LendcleanError, Result};
use crate::provenance::{LookupRules, LookupTable, build_lookup};
use crate::reference::{StateNames, apply_state_names};
use crate::table::{Dataset, Value};
use crate::transform::features::{
    affordability_flag, decompose_date, extract_term, installment_column,
};
use crate::transform::grade::derive_letter_grade;
use crate::transform::impute::{derive_income_bracket, fill_constant, impute_grouped};
use crate::transform::onehot::one_hot_top_n;
use crate::transform::schema::{drop_columns, lowercase_text, replace_text};
use crate::transform::scale::observed_range;
use crate::transform::{
    Aggregate, Fallback, GroupImpute, HomeOwnership, InstallmentInputs, LetterGrade, LoanStatus,
    VerificationStatus, cap_outliers, encode_ordinal, min_max_scale, normalize_column_name,
    normalize_schema,
};

const GRADE: &str = "grade";
const LETTER_GRADE: &str = "letter_grade";
const LOAN_TYPE: &str = "type";
const INT_RATE: &str = "int_rate";
const ANNUAL_INC: &str = "annual_inc";
const ANNUAL_INC_JOINT: &str = "annual_inc_joint";
const INCOME_RANGE: &str = "income_range";
const EMP_TITLE: &str = "emp_title";
const EMP_LENGTH: &str = "emp_length";
const LOAN_STATUS: &str = "loan_status";
const VERIFICATION_STATUS: &str = "verification_status";
const HOME_OWNERSHIP: &str = "home_ownership";
const ISSUE_DATE: &str = "issue_date";
const MONTH_NUMBER: &str = "month_number";
const LOAN_AMOUNT: &str = "loan_amount";
const SALARY_CAN_COVER: &str = "salary_can_cover";
const TERM: &str = "term";
const TERM_INT: &str = "term_int";
const INSTALLMENT: &str = "installment_per_month";
const STATE: &str = "state";
const STATE_NAME: &str = "state_name";

/// Normalized raw columns the fixed stages read.
pub const REQUIRED_COLUMNS: &[&str] = &[
    EMP_TITLE,
    EMP_LENGTH,
    HOME_OWNERSHIP,
    ANNUAL_INC,
    ANNUAL_INC_JOINT,
    VERIFICATION_STATUS,
    LOAN_STATUS,
    LOAN_AMOUNT,
    STATE,
    TERM,
    INT_RATE,
    GRADE,
    ISSUE_DATE,
    LOAN_TYPE,
];

/// Fallback for an employment field whose income bracket has no observed value.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Column lists and rules for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Unique row key; becomes the dataset index.
    pub index_column: String,
    /// Columns dropped before the snapshot (duplicates of other columns).
    pub drop_columns: Vec<String>,
    /// Columns clamped to their 10th/90th percentiles.
    pub outlier_columns: Vec<String>,
    /// Categorical columns expanded into top-N indicators.
    pub one_hot_columns: Vec<String>,
    /// Number of indicators per one-hot column.
    pub top_n: usize,
    /// Columns rescaled to [0, 1].
    pub scale_columns: Vec<String>,
    /// Lookup table special cases.
    pub lookup: LookupRules,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_column: "customer_id".to_string(),
            drop_columns: strings(&["description", "addr_state"]),
            outlier_columns: strings(&[
                "annual_inc",
                "avg_cur_bal",
                "tot_cur_bal",
                "int_rate",
                "loan_amount",
            ]),
            one_hot_columns: strings(&[
                "emp_title",
                "emp_length",
                "zip_code",
                "state",
                "term",
                "type",
                "purpose",
            ]),
            top_n: 3,
            scale_columns: strings(&[
                "annual_inc",
                "annual_inc_joint",
                "avg_cur_bal",
                "tot_cur_bal",
                "loan_amount",
                "funded_amount",
                "int_rate",
                "installment_per_month",
            ]),
            lookup: LookupRules::default(),
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Fully transformed dataset.
    pub cleaned: Dataset,
    /// Audit trail of repaired and encoded values.
    pub lookup: LookupTable,
}

/// Runs the cleaning stages in order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

fn has_column(dataset: &Dataset, column: &str) -> bool {
    let present = dataset.has_column(column);
    if !present {
        tracing::debug!(column, "Configured column absent; skipped");
    }
    present
}

/// Fail with the first required column the dataset lacks.
fn check_required(dataset: &Dataset) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !dataset.has_column(c))
        .collect();
    match missing.first() {
        Some(first) => {
            tracing::error!(missing = ?missing, "Raw extract lacks required columns");
            Err(LendcleanError::ColumnNotFound(first.to_string()))
        }
        None => Ok(()),
    }
}

impl Pipeline {
    /// Create a pipeline with the default column lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every phase and build the lookup table.
    ///
    /// `state_names` feeds the `state_name` column; with `None` that column
    /// is not produced.
    pub fn run(&self, raw: Dataset, state_names: Option<&StateNames>) -> Result<PipelineOutput> {
        let snapshot = self.prepare(raw)?;
        let repaired = self.repair(snapshot.clone())?;
        let lookup = build_lookup(&snapshot, &repaired, &self.config.lookup)?;
        drop(snapshot);
        let cleaned = self.reshape(repaired, state_names)?;

        tracing::info!(
            rows = cleaned.row_count(),
            columns = cleaned.column_count(),
            lookup_records = lookup.len(),
            "Pipeline complete"
        );
        Ok(PipelineOutput { cleaned, lookup })
    }

    /// Normalize names, set the index, and apply the pre-snapshot tidying.
    pub fn prepare(&self, raw: Dataset) -> Result<Dataset> {
        let index = normalize_column_name(&self.config.index_column);
        let mut ds = normalize_schema(raw, &index)?;
        check_required(&ds)?;

        let droppable: Vec<&str> = self
            .config
            .drop_columns
            .iter()
            .map(String::as_str)
            .filter(|c| ds.has_column(c))
            .collect();
        ds = drop_columns(ds, &droppable)?;

        ds = lowercase_text(ds, LOAN_TYPE)?;
        ds = replace_text(ds, LOAN_TYPE, "joint app", "joint")?;
        ds = derive_letter_grade(ds, GRADE, LETTER_GRADE)?;

        tracing::info!(
            rows = ds.row_count(),
            columns = ds.column_count(),
            "Prepared snapshot"
        );
        Ok(ds)
    }

    /// Fill missing values and apply the ordinal encodings.
    pub fn repair(&self, snapshot: Dataset) -> Result<Dataset> {
        let mut ds = snapshot;

        let rule = GroupImpute::new(
            INT_RATE,
            GRADE,
            Aggregate::Median,
            Fallback::ColumnWide(Value::Float(0.0)),
        );
        ds = impute_grouped(ds, &rule)?;
        ds = fill_constant(ds, ANNUAL_INC_JOINT, Value::Int(0))?;

        ds = derive_income_bracket(ds, ANNUAL_INC, INCOME_RANGE)?;
        for target in [EMP_TITLE, EMP_LENGTH] {
            let rule = GroupImpute::new(
                target,
                INCOME_RANGE,
                Aggregate::Mode,
                Fallback::Constant(Value::text(UNKNOWN_CATEGORY)),
            );
            ds = impute_grouped(ds, &rule)?;
        }
        ds = ds.without_column(INCOME_RANGE)?;

        ds = encode_ordinal::<LoanStatus>(ds, LOAN_STATUS)?;
        ds = encode_ordinal::<LetterGrade>(ds, LETTER_GRADE)?;
        ds = encode_ordinal::<VerificationStatus>(ds, VERIFICATION_STATUS)?;
        ds = encode_ordinal::<HomeOwnership>(ds, HOME_OWNERSHIP)?;

        tracing::info!(columns = ds.column_count(), "Repaired and encoded");
        Ok(ds)
    }

    /// Cap, derive, expand, and scale.
    pub fn reshape(&self, repaired: Dataset, state_names: Option<&StateNames>) -> Result<Dataset> {
        let mut ds = repaired;

        for column in &self.config.outlier_columns {
            if has_column(&ds, column) {
                ds = cap_outliers(ds, column)?;
            }
        }

        ds = decompose_date(ds, ISSUE_DATE, MONTH_NUMBER)?;
        ds = affordability_flag(ds, ANNUAL_INC, LOAN_AMOUNT, SALARY_CAN_COVER)?;
        ds = extract_term(ds, TERM, TERM_INT)?;
        let inputs = InstallmentInputs {
            principal: LOAN_AMOUNT,
            annual_rate: INT_RATE,
            months: TERM_INT,
        };
        ds = installment_column(ds, inputs, INSTALLMENT)?;
        ds = ds.without_column(TERM_INT)?;

        for column in &self.config.one_hot_columns {
            if has_column(&ds, column) {
                ds = one_hot_top_n(ds, column, self.config.top_n)?;
            }
        }

        let scalable = self.scalable_columns(&ds)?;
        ds = min_max_scale(ds, &scalable)?;

        match state_names {
            Some(names) => ds = apply_state_names(ds, STATE, STATE_NAME, names)?,
            None => tracing::debug!("No state reference; state names not attached"),
        }

        tracing::info!(
            rows = ds.row_count(),
            columns = ds.column_count(),
            "Reshaped"
        );
        Ok(ds)
    }

    /// Configured scale columns that are present and have a non-zero range.
    fn scalable_columns(&self, ds: &Dataset) -> Result<Vec<String>> {
        let mut scalable = Vec::new();
        for column in &self.config.scale_columns {
            if !has_column(ds, column) {
                continue;
            }
            match observed_range(ds, column)? {
                Some((min, max)) if max > min => scalable.push(column.clone()),
                Some(_) => tracing::warn!(column = %column, "Zero-variance column not scaled"),
                None => tracing::warn!(column = %column, "All-missing column not scaled"),
            }
        }
        Ok(scalable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::StaticStateNames;
    use crate::table::Column;

    const HEADERS: [&str; 15] = [
        "Customer Id",
        "Emp Title",
        "Emp Length",
        "Home Ownership",
        "Annual Inc",
        "Annual Inc Joint",
        "Verification Status",
        "Loan Status",
        "Loan Amount",
        "State",
        "Term",
        "Int Rate",
        "Grade",
        "Issue Date",
        "Type",
    ];

    fn loan(id: &str, title: &str, income: &str, rate: &str, grade: &str) -> [String; 15] {
        [
            id, title, "2 years", "RENT", income, "", "Verified", "Current", "10000", "TX",
            "36 months", rate, grade, "17 March 2016", "JOINT APP",
        ]
        .map(String::from)
    }

    fn loans(rows: &[[String; 15]]) -> Dataset {
        Dataset::from_rows(
            HEADERS.iter().map(|h| h.to_string()).collect(),
            &rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_builds_snapshot() {
        let ds = loans(&[
            loan("c1", "Teacher", "40000", "0.1", "12"),
            loan("c2", "Nurse", "50000", "0.2", "40"),
        ]);
        let ds = ds
            .with_column("Description", Column::infer(&["car", "car"]))
            .unwrap()
            .with_column("Addr State", Column::infer(&["TX", "TX"]))
            .unwrap();
        let ds = Pipeline::new().prepare(ds).unwrap();

        assert_eq!(ds.index().unwrap().name, "customer_id");
        assert!(!ds.has_column("description"));
        assert!(!ds.has_column("addr_state"));
        assert_eq!(
            ds.column("type").unwrap().values(),
            &[Value::text("joint"), Value::text("joint")]
        );
        assert_eq!(
            ds.column("letter_grade").unwrap().values(),
            &[Value::text("C"), Value::Unmapped]
        );
    }

    #[test]
    fn test_missing_index_column_is_error() {
        let ds = Dataset::from_rows(
            vec!["grade".into(), "annual_inc".into(), "loan_amount".into()],
            &[vec!["3".into(), "80000".into(), "60000".into()]],
        )
        .unwrap();
        let err = Pipeline::new().run(ds, None).unwrap_err();
        assert!(matches!(err, LendcleanError::ColumnNotFound(name) if name == "customer_id"));
    }

    #[test]
    fn test_missing_required_column_is_error() {
        let ds = loans(&[loan("c1", "Teacher", "40000", "0.1", "3")])
            .without_column("Int Rate")
            .unwrap();
        let err = Pipeline::new().prepare(ds).unwrap_err();
        assert!(matches!(err, LendcleanError::ColumnNotFound(name) if name == "int_rate"));
    }

    #[test]
    fn test_absent_configured_columns_are_skipped() {
        let config = PipelineConfig {
            outlier_columns: vec!["not_there".to_string()],
            one_hot_columns: vec!["not_there".to_string()],
            scale_columns: vec!["not_there".to_string()],
            ..PipelineConfig::default()
        };
        let ds = loans(&[loan("c1", "Teacher", "40000", "0.1", "3")]);
        let output = Pipeline::with_config(config).run(ds, None).unwrap();
        assert!(output.cleaned.has_column("installment_per_month"));
    }

    #[test]
    fn test_repair_fills_by_group() {
        let mut rows = vec![
            loan("c1", "Teacher", "40000", "10.0", "3"),
            loan("c2", "", "45000", "", "3"),
            loan("c3", "", "300000", "30.0", "3"),
        ];
        rows[1][5] = "90000".to_string();
        let pipeline = Pipeline::new();
        let ds = pipeline.repair(pipeline.prepare(loans(&rows)).unwrap()).unwrap();

        assert_eq!(ds.column("int_rate").unwrap().get(1), Some(&Value::Float(20.0)));
        assert_eq!(ds.column("emp_title").unwrap().get(1), Some(&Value::text("Teacher")));
        assert_eq!(
            ds.column("emp_title").unwrap().get(2),
            Some(&Value::text(UNKNOWN_CATEGORY))
        );
        assert_eq!(ds.column("annual_inc_joint").unwrap().get(0), Some(&Value::Int(0)));
        assert!(!ds.has_column("income_range"));
        assert_eq!(ds.column("letter_grade").unwrap().get(0), Some(&Value::Int(6)));
    }

    #[test]
    fn test_zero_variance_not_scaled() {
        let ds = Dataset::from_columns([
            ("loan_amount", Column::new(vec![Value::Int(5), Value::Int(5)])),
            ("annual_inc", Column::new(vec![Value::Int(0), Value::Int(10)])),
            ("int_rate", Column::new(vec![Value::Missing, Value::Missing])),
        ])
        .unwrap();
        let scalable = Pipeline::new().scalable_columns(&ds).unwrap();
        assert_eq!(scalable, vec!["annual_inc".to_string()]);
    }

    #[test]
    fn test_state_names_attached() {
        let ds = loans(&[loan("c1", "Teacher", "40000", "0.1", "3")]);
        let names = StaticStateNames::table();
        let cleaned = Pipeline::new().run(ds, Some(&names)).unwrap().cleaned;
        assert_eq!(cleaned.column("state_name").unwrap().get(0), Some(&Value::text("Texas")));
        assert!(cleaned.has_column("state_TX"));
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());

        let config: PipelineConfig = serde_json::from_str(r#"{"top_n": 5}"#).unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.index_column, "customer_id");
    }
}
