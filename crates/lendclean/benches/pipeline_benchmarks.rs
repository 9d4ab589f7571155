//! Full pipeline performance benchmarks.
//!
//! Measures parsing plus the complete cleaning pipeline on synthetic loan data.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lendclean::transform::cap_outliers;
use lendclean::{Parser, Pipeline, StaticStateNames};

/// Generate a loan extract with missing values and a few outliers.
fn generate_loans(rows: usize) -> String {
    let mut data = String::new();
    data.push_str(
        "Customer Id,Emp Title,Emp Length,Home Ownership,Annual Inc,Annual Inc Joint,\
         Verification Status,Zip Code,Addr State,Avg Cur Bal,Tot Cur Bal,Loan Status,\
         Loan Amount,State,Funded Amount,Term,Int Rate,Grade,Issue Date,Type,Purpose,Description\n",
    );

    let titles = ["Teacher", "Nurse", "Manager", "Driver", ""];
    let lengths = ["10+ years", "2 years", "< 1 year", ""];
    let homes = ["RENT", "OWN", "MORTGAGE", "ANY", "NONE"];
    let verification = ["Verified", "Source Verified", "Not Verified"];
    let statuses = ["Fully Paid", "Current", "Charged Off", "Late (31-120 days)", "Default"];
    let states = ["NY", "CA", "TX", "FL", "WA"];
    let months = ["January", "March", "June", "September", "December"];
    let types = ["Individual", "JOINT APP", "Joint App", "INDIVIDUAL"];
    let purposes = ["debt_consolidation", "credit_card", "home_improvement", "other"];

    for row in 0..rows {
        let income = if row % 97 == 0 { 2_000_000 } else { 30_000 + (row % 40) * 5_000 };
        let joint = if row % 5 == 0 { format!("{}", income * 2) } else { String::new() };
        let rate = if row % 11 == 0 { String::new() } else { format!("{:.3}", 0.05 + (row % 20) as f64 * 0.01) };
        let state = states[row % states.len()];
        data.push_str(&format!(
            "C{:06},{},{},{},{},{},{},{}xx,{},{},{},{},{},{},{},{} months,{},{},{} {} {},{},{},desc\n",
            row,
            titles[row % titles.len()],
            lengths[row % lengths.len()],
            homes[row % homes.len()],
            income,
            joint,
            verification[row % verification.len()],
            100 + row % 50,
            state,
            1_000 + (row % 30) * 700,
            10_000 + (row % 60) * 4_000,
            statuses[row % statuses.len()],
            2_000 + (row % 35) * 1_000,
            state,
            2_000 + (row % 35) * 1_000,
            if row % 3 == 0 { 60 } else { 36 },
            rate,
            1 + row % 35,
            1 + row % 28,
            months[row % months.len()],
            2015 + row % 5,
            types[row % types.len()],
            purposes[row % purposes.len()],
        ));
    }
    data
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    let names = StaticStateNames::table();
    let pipeline = Pipeline::new();

    for rows in [100, 1_000, 10_000] {
        let csv = generate_loans(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &csv, |b, csv| {
            b.iter(|| {
                let raw = Parser::new().parse_bytes(csv.as_bytes(), b',').unwrap();
                black_box(pipeline.run(raw, Some(&names)).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_outlier_capping(c: &mut Criterion) {
    let mut group = c.benchmark_group("cap_outliers");

    for rows in [1_000, 100_000] {
        let raw = Parser::new()
            .parse_bytes(generate_loans(rows).as_bytes(), b',')
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &raw, |b, raw| {
            b.iter(|| black_box(cap_outliers(raw.clone(), "Annual Inc").unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_pipeline, bench_outlier_capping);
criterion_main!(benches);
