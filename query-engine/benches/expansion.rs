//! FILENAME: query-engine/benches/expansion.rs
//! Criterion benchmarks for query-table construction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use query_engine::{
    build_query_table, AxisExpr, FieldUsage, Layer, Layout, Query, UsageStore,
};

/// A templated query with a wide row template (eight alternated facets,
/// each nested with a measure) and a four-facet column template.
fn create_benchmark_input() -> (Query, UsageStore) {
    let mut store = UsageStore::new();

    let measure = store.push(FieldUsage::max_of(0));
    let row_facets: Vec<AxisExpr> = (1..9)
        .map(|field| {
            let split = store.push(FieldUsage::elements_split(field));
            AxisExpr::Cross(vec![AxisExpr::Usage(split), AxisExpr::Usage(measure)])
        })
        .collect();

    let col_facets: Vec<AxisExpr> = (9..13)
        .map(|field| {
            let agg = store.push(FieldUsage::average_of(field));
            AxisExpr::Usage(agg)
        })
        .collect();

    let query = Query::new(
        "benchmark",
        Layout::new(AxisExpr::Concat(row_facets), AxisExpr::Concat(col_facets)),
        Layer::new(),
    );
    (query, store)
}

fn bench_expansion(c: &mut Criterion) {
    let (query, store) = create_benchmark_input();

    c.bench_function("build_query_table_8x4", |b| {
        b.iter(|| build_query_table(black_box(&query), black_box(&store)).unwrap())
    });

    c.bench_function("normalize_row_template", |b| {
        b.iter(|| black_box(&query.layout.rows).normalize())
    });
}

criterion_group!(benches, bench_expansion);
criterion_main!(benches);
