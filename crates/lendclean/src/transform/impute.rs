//! Missing-value imputation from group-wise statistics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::{Column, Dataset, Value};

use super::stats;

/// Aggregate used to summarize a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    /// Median of numeric values (continuous fields).
    Median,
    /// Most frequent value (categorical fields).
    Mode,
}

impl Aggregate {
    fn apply<'a, I>(self, column: &str, values: I) -> Result<Option<Value>>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        match self {
            Aggregate::Median => {
                let numbers = Column::from_iter(values.into_iter().cloned()).numeric(column)?;
                let numbers: Vec<f64> = numbers.into_iter().flatten().collect();
                Ok(stats::median(&numbers).map(Value::Float))
            }
            Aggregate::Mode => Ok(stats::mode(values)),
        }
    }
}

/// Value used when a group has no observed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Always this constant.
    Constant(Value),
    /// The aggregate over the whole column, or this constant if the column
    /// has no observed values either.
    ColumnWide(Value),
}

/// One grouped fill: `target` is filled from `aggregate` over groups of `group_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupImpute {
    pub target: String,
    pub group_by: String,
    pub aggregate: Aggregate,
    pub fallback: Fallback,
}

impl GroupImpute {
    pub fn new(
        target: impl Into<String>,
        group_by: impl Into<String>,
        aggregate: Aggregate,
        fallback: Fallback,
    ) -> Self {
        Self {
            target: target.into(),
            group_by: group_by.into(),
            aggregate,
            fallback,
        }
    }
}

/// Per-group summary of a target column.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStatistic {
    /// Statistic per group key; `None` when the group had no observed values.
    groups: IndexMap<String, Option<Value>>,
    /// Statistic over every observed value of the target.
    overall: Option<Value>,
}

impl GroupStatistic {
    /// Compute `aggregate` of `target` for each distinct value of `group_by`.
    ///
    /// Rows whose group key is missing belong to no group.
    pub fn compute(
        dataset: &Dataset,
        target: &str,
        group_by: &str,
        aggregate: Aggregate,
    ) -> Result<Self> {
        let values = dataset.column(target)?;
        let keys = dataset.column(group_by)?;

        let mut members: IndexMap<String, Vec<&Value>> = IndexMap::new();
        for (key, value) in keys.iter().zip(values.iter()) {
            if key.is_missing() {
                continue;
            }
            let bucket = members.entry(key.to_string()).or_default();
            if !value.is_missing() {
                bucket.push(value);
            }
        }

        let mut groups = IndexMap::with_capacity(members.len());
        for (key, observed) in members {
            groups.insert(key, aggregate.apply(target, observed)?);
        }
        let overall = aggregate.apply(target, values.observed())?;

        Ok(Self { groups, overall })
    }

    /// Statistic for a group key, if the group exists and had observations.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.groups.get(&key.to_string()).and_then(Option::as_ref)
    }

    pub fn overall(&self) -> Option<&Value> {
        self.overall.as_ref()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Fill missing `rule.target` values with the statistic of their own group.
pub fn impute_grouped(dataset: Dataset, rule: &GroupImpute) -> Result<Dataset> {
    let stat = GroupStatistic::compute(&dataset, &rule.target, &rule.group_by, rule.aggregate)?;
    tracing::debug!(
        target_column = %rule.target,
        group_by = %rule.group_by,
        groups = stat.group_count(),
        "Computed group statistic"
    );

    let fallback = match &rule.fallback {
        Fallback::Constant(value) => value.clone(),
        Fallback::ColumnWide(default) => stat.overall().cloned().unwrap_or_else(|| default.clone()),
    };

    let keys = dataset.column(&rule.group_by)?;
    let mut filled = 0usize;
    let column: Column = dataset
        .column(&rule.target)?
        .iter()
        .zip(keys.iter())
        .map(|(value, key)| {
            if !value.is_missing() || key.is_missing() {
                return value.clone();
            }
            filled += 1;
            stat.get(key).cloned().unwrap_or_else(|| fallback.clone())
        })
        .collect();

    tracing::info!(column = %rule.target, filled, "Imputed missing values");
    dataset.with_column(rule.target.clone(), column)
}

/// Fill every missing value of `column` with `value`.
///
/// For fields where absence means "not applicable" rather than "unknown".
pub fn fill_constant(dataset: Dataset, column: &str, value: Value) -> Result<Dataset> {
    dataset.map_column(column, |v| {
        if v.is_missing() {
            value.clone()
        } else {
            v.clone()
        }
    })
}

/// Ordered annual-income brackets used as an imputation grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeBracket {
    VeryLow,
    Low,
    MidLow,
    Mid,
    MidHigh,
    High,
}

impl IncomeBracket {
    /// Bracket for an income. Intervals are right-closed:
    /// (0, 50k], (50k, 100k], ..., (250k, inf). Non-positive incomes have none.
    pub fn from_income(income: f64) -> Option<Self> {
        if income.is_nan() || income <= 0.0 {
            return None;
        }
        Some(match income {
            i if i <= 50_000.0 => IncomeBracket::VeryLow,
            i if i <= 100_000.0 => IncomeBracket::Low,
            i if i <= 150_000.0 => IncomeBracket::MidLow,
            i if i <= 200_000.0 => IncomeBracket::Mid,
            i if i <= 250_000.0 => IncomeBracket::MidHigh,
            _ => IncomeBracket::High,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            IncomeBracket::VeryLow => "Very-Low",
            IncomeBracket::Low => "Low",
            IncomeBracket::MidLow => "Mid-Low",
            IncomeBracket::Mid => "Mid",
            IncomeBracket::MidHigh => "Mid-High",
            IncomeBracket::High => "High",
        }
    }
}

/// Add `target` holding the income bracket label of `income_column`.
pub fn derive_income_bracket(dataset: Dataset, income_column: &str, target: &str) -> Result<Dataset> {
    let brackets: Column = dataset
        .column(income_column)?
        .numeric(income_column)?
        .into_iter()
        .map(|income| {
            income
                .and_then(IncomeBracket::from_income)
                .map_or(Value::Missing, |b| Value::text(b.label()))
        })
        .collect();
    dataset.with_column(target, brackets)
}
