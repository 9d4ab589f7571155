//! Derived columns: installment, date parts, affordability flag, term months.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::table::{Column, Dataset, Value};

/// Format of issue dates in the raw data, e.g. `17 March 2016`.
pub const ISSUE_DATE_FORMAT: &str = "%d %B %Y";

static LEADING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)").expect("digit pattern is valid"));

/// Monthly payment of an amortized loan.
///
/// `annual_rate` is a fraction (0.12 for 12%). With a zero rate the
/// principal is simply split over the term.
pub fn monthly_installment(principal: f64, annual_rate: f64, months: f64) -> f64 {
    let r = annual_rate / 12.0;
    if r == 0.0 {
        return principal / months;
    }
    let growth = (1.0 + r).powf(months);
    principal * r * growth / (growth - 1.0)
}

/// Parse a `day fullMonthName year` date. Anything else is `None`.
pub fn parse_issue_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), ISSUE_DATE_FORMAT).ok()
}

/// First run of digits in a term string: `"36 months"` gives 36.
pub fn term_months(raw: &str) -> Option<i64> {
    LEADING_DIGITS
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse `date_column` in place and add `month_column` with the month number.
///
/// Unparsable dates become missing; the month of a missing date is missing.
pub fn decompose_date(dataset: Dataset, date_column: &str, month_column: &str) -> Result<Dataset> {
    let mut unparsed = 0usize;
    let dates: Column = dataset
        .column(date_column)?
        .iter()
        .map(|value| match value {
            Value::Date(d) => Value::Date(*d),
            Value::Missing => Value::Missing,
            other => match parse_issue_date(&other.to_string()) {
                Some(d) => Value::Date(d),
                None => {
                    unparsed += 1;
                    Value::Missing
                }
            },
        })
        .collect();

    if unparsed > 0 {
        tracing::warn!(column = date_column, unparsed, "Unparsable dates set to missing");
    }

    let months: Column = dates
        .iter()
        .map(|value| match value {
            Value::Date(d) => Value::Int(i64::from(d.month())),
            _ => Value::Missing,
        })
        .collect();

    dataset
        .with_column(date_column, dates)?
        .with_column(month_column, months)
}

/// Add `target` stating whether `income_column >= amount_column`.
pub fn affordability_flag(
    dataset: Dataset,
    income_column: &str,
    amount_column: &str,
    target: &str,
) -> Result<Dataset> {
    let income = dataset.column(income_column)?.numeric(income_column)?;
    let amount = dataset.column(amount_column)?.numeric(amount_column)?;
    let flags: Column = income
        .into_iter()
        .zip(amount)
        .map(|pair| match pair {
            (Some(i), Some(a)) => Value::Bool(i >= a),
            _ => Value::Missing,
        })
        .collect();
    dataset.with_column(target, flags)
}

/// Add `target` with the integer month count extracted from `term_column`.
pub fn extract_term(dataset: Dataset, term_column: &str, target: &str) -> Result<Dataset> {
    let mut unparsed = 0usize;
    let terms: Column = dataset
        .column(term_column)?
        .iter()
        .map(|value| match value {
            Value::Missing => Value::Missing,
            Value::Int(n) => Value::Int(*n),
            other => match term_months(&other.to_string()) {
                Some(n) => Value::Int(n),
                None => {
                    unparsed += 1;
                    Value::Missing
                }
            },
        })
        .collect();

    if unparsed > 0 {
        tracing::warn!(column = term_column, unparsed, "Terms without a month count");
    }
    dataset.with_column(target, terms)
}

/// Column names feeding [`installment_column`].
#[derive(Debug, Clone, Copy)]
pub struct InstallmentInputs<'a> {
    pub principal: &'a str,
    pub annual_rate: &'a str,
    pub months: &'a str,
}

/// Add `target` with the monthly installment of each row.
///
/// A row missing any input gets a missing installment.
pub fn installment_column(
    dataset: Dataset,
    inputs: InstallmentInputs<'_>,
    target: &str,
) -> Result<Dataset> {
    let principal = dataset.column(inputs.principal)?.numeric(inputs.principal)?;
    let rate = dataset.column(inputs.annual_rate)?.numeric(inputs.annual_rate)?;
    let months = dataset.column(inputs.months)?.numeric(inputs.months)?;

    let installments: Column = principal
        .into_iter()
        .zip(rate)
        .zip(months)
        .map(|row| match row {
            ((Some(p), Some(r)), Some(n)) => Value::Float(monthly_installment(p, r, n)),
            _ => Value::Missing,
        })
        .collect();
    dataset.with_column(target, installments)
}
