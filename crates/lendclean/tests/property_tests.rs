//! Property-based tests for the lendclean transforms.
//!
//! These tests use proptest to generate random columns and verify that the
//! transforms keep their invariants under all inputs.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p lendclean --test property_tests
//!
//! # More cases (slower)
//! PROPTEST_CASES=10000 cargo test -p lendclean --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use lendclean::provenance::{LookupRules, build_lookup};
use lendclean::transform::grade::{GradeMode, bucket_grade};
use lendclean::transform::onehot::one_hot_top_n;
use lendclean::transform::{
    LetterGrade, OrdinalScale, cap_outliers, min_max_scale, monthly_installment,
};
use lendclean::{Column, Dataset, Value};

// =============================================================================
// Test Strategies
// =============================================================================

/// Numeric cells with some missing values mixed in.
fn numeric_cells() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        prop_oneof![
            4 => (-1.0e6f64..1.0e6).prop_map(Value::Float),
            1 => Just(Value::Missing),
        ],
        1..60,
    )
}

/// Small categorical cells, so repeats are common.
fn category_cells() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        prop_oneof![
            4 => "[a-d]".prop_map(Value::text),
            1 => Just(Value::Missing),
        ],
        1..60,
    )
}

fn single(name: &str, values: Vec<Value>) -> Dataset {
    Dataset::from_columns([(name, Column::new(values))]).unwrap()
}

// =============================================================================
// Grade bucketer
// =============================================================================

proptest! {
    #[test]
    fn strict_bucket_matches_bins(grade in 1i64..=35) {
        let expected = LetterGrade::LEVELS[((grade - 1) / 5) as usize].label();
        prop_assert_eq!(bucket_grade(&Value::Int(grade), GradeMode::Strict), Value::text(expected));
        prop_assert_eq!(bucket_grade(&Value::Int(grade), GradeMode::Passthrough), Value::text(expected));
    }

    #[test]
    fn out_of_range_grades(grade in prop_oneof![-1000i64..=0, 36i64..1000]) {
        prop_assert_eq!(bucket_grade(&Value::Int(grade), GradeMode::Strict), Value::Unmapped);
        prop_assert_eq!(bucket_grade(&Value::Int(grade), GradeMode::Passthrough), Value::Int(grade));
    }
}

// =============================================================================
// Outlier capping
// =============================================================================

proptest! {
    #[test]
    fn capping_is_idempotent(values in numeric_cells()) {
        let once = cap_outliers(single("x", values), "x").unwrap();
        let twice = cap_outliers(once.clone(), "x").unwrap();
        prop_assert_eq!(once.column("x").unwrap().values(), twice.column("x").unwrap().values());
    }

    #[test]
    fn capping_keeps_missing_positions(values in numeric_cells()) {
        let capped = cap_outliers(single("x", values.clone()), "x").unwrap();
        for (before, after) in values.iter().zip(capped.column("x").unwrap().iter()) {
            prop_assert_eq!(before.is_missing(), after.is_missing());
        }
    }
}

// =============================================================================
// Scaling and installment
// =============================================================================

proptest! {
    #[test]
    fn scaled_values_in_unit_interval(values in numeric_cells()) {
        let ds = single("x", values);
        let observed: Vec<f64> = ds.column("x").unwrap().iter().filter_map(Value::as_f64).collect();
        let min = observed.iter().copied().fold(f64::INFINITY, f64::min);
        let max = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assume!(!observed.is_empty() && max > min);

        let scaled = min_max_scale(ds, &["x"]).unwrap();
        for v in scaled.column("x").unwrap().iter().filter_map(Value::as_f64) {
            prop_assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn installment_bounds(principal in 100.0f64..1.0e6, rate in prop_oneof![Just(0.0f64), 0.001f64..0.4], months in 1u32..=360) {
        let n = f64::from(months);
        let m = monthly_installment(principal, rate, n);
        prop_assert!(m > 0.0);
        // Never below the interest-free split, never above the whole loan plus a month's interest.
        prop_assert!(m >= principal / n - 1e-6);
        prop_assert!(m <= principal * (1.0 + rate / 12.0) + 1e-6);
    }
}

// =============================================================================
// One-hot and lookup
// =============================================================================

proptest! {
    #[test]
    fn one_hot_rows_have_at_most_one_flag(values in category_cells(), n in 1usize..4) {
        let ds = one_hot_top_n(single("c", values.clone()), "c", n).unwrap();
        let indicators: Vec<&Column> = ds
            .columns()
            .filter(|(name, _)| name.starts_with("c_"))
            .map(|(_, col)| col)
            .collect();
        prop_assert!(indicators.len() <= n);
        for row in 0..values.len() {
            let flags: i64 = indicators.iter().filter_map(|c| c.get(row).and_then(Value::as_i64)).sum();
            prop_assert!(flags <= 1);
        }
    }

    #[test]
    fn lookup_has_one_record_per_original(before in category_cells(), seed in any::<u64>()) {
        let after: Vec<Value> = before
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Missing => Value::text(format!("fill{}", seed.wrapping_add(i as u64) % 3)),
                other => Value::text(format!("{}{}", other, seed.wrapping_add(i as u64) % 2)),
            })
            .collect();
        let lookup = build_lookup(
            &single("emp_title", before),
            &single("emp_title", after),
            &LookupRules::default(),
        )
        .unwrap();

        let mut seen = HashSet::new();
        for record in lookup.iter() {
            prop_assert!(seen.insert(record.original.clone()));
        }
    }
}
