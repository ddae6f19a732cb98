//! Benchmarks for row-count statement construction.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rowscope_common::{CountRequest, FilterClause, FilterOperator, TableDescriptor};
use rowscope_core::RowCountEstimator;

fn bench_build_statement(c: &mut Criterion) {
    let estimator = RowCountEstimator::new();
    let table = TableDescriptor::new(16_384u32, "orders").with_schema("public");

    let unfiltered = CountRequest::new(table.clone());
    c.bench_function("build_unfiltered", |b| {
        b.iter(|| estimator.build_statement(black_box(&unfiltered)));
    });

    let filtered = CountRequest::new(table.clone()).with_filters([
        FilterClause::new("status", FilterOperator::In, "paid,shipped,refunded"),
        FilterClause::new("customer", FilterOperator::ILike, "%o'neil%"),
        FilterClause::new("total", FilterOperator::Gte, "100"),
        FilterClause::new("deleted_at", FilterOperator::Is, "null"),
    ]);
    c.bench_function("build_filtered", |b| {
        b.iter(|| estimator.build_statement(black_box(&filtered)));
    });

    let exact = filtered.clone().with_exact_count(true);
    c.bench_function("build_exact", |b| {
        b.iter(|| estimator.build_statement(black_box(&exact)));
    });
}

criterion_group!(benches, bench_build_statement);
criterion_main!(benches);
