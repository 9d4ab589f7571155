//! Grouped-aggregate building blocks: quantiles, median, mode, value counts.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::table::Value;

/// Quantile of `values` with linear interpolation between closest ranks.
///
/// NaNs are ignored. Returns `None` when nothing remains.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median (the 0.5 quantile).
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Frequency of each distinct observed value, in first-seen order.
///
/// Values are keyed by their display form; missing values are skipped.
pub fn value_counts<'a, I>(values: I) -> IndexMap<String, (Value, usize)>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut counts: IndexMap<String, (Value, usize)> = IndexMap::new();
    for value in values {
        if value.is_missing() {
            continue;
        }
        counts
            .entry(value.to_string())
            .or_insert_with(|| (value.clone(), 0))
            .1 += 1;
    }
    counts
}

/// Most frequent observed value. Ties go to the smallest value.
pub fn mode<'a, I>(values: I) -> Option<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    value_counts(values)
        .into_values()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| compare_values(b, a)))
        .map(|(value, _)| value)
}

/// The `n` most frequent observed values, most frequent first.
///
/// Equal counts keep first-seen order.
pub fn top_n<'a, I>(values: I, n: usize) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut counts: Vec<(Value, usize)> = value_counts(values).into_values().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(value, _)| value).collect()
}

/// Total order used for tie-breaking: numbers numerically, otherwise by display form.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
