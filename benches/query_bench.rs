//! Query engine benchmarks.
//!
//! Every query scans the table in row order until the result cap is reached,
//! so cost depends on selectivity as much as on table size: a broad query
//! stops after the first 1000 matches, a narrow one walks the whole table.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `scan/selectivity` | Full-table queries from "everything" down to "almost nothing" |
//! | `scan/scaling` | A mid-selectivity query as the table grows from 10k to 1M rows |
//! | `session/batching` | Evaluating and slicing a capped result into update batches |
//!
//! # Viewing results
//!
//! ```sh
//! cargo bench --bench query_bench
//! open target/criterion/report/index.html
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use protmap_core::query::{BoundingBox, NumericRange, Query};
use protmap_core::table::{PointRow, PointTableBuilder};
use protmap_core::terms::{TermMembershipCache, TermStore};
use protmap_core::{PointTable, QueryEngine};
use std::collections::HashSet;
use std::hint::black_box;
use std::sync::Arc;

const KINDS: [&str; 4] = ["mip-clusters", "hclust30-clusters", "afdb-clusters-dark", "afdb-clusters-light"];

/// `n` rows spread over the default plot area with varied attributes.
fn table(n: usize) -> Arc<PointTable> {
    let mut builder = PointTableBuilder::new();
    for i in 0..n {
        builder.push(PointRow {
            protein: format!("P{i:07}"),
            x: Some(-15.0 + (i % 3001) as f64 / 100.0),
            y: Some(-25.0 + (i % 4001) as f64 / 100.0),
            kind: KINDS[i % KINDS.len()].to_string(),
            length: 50 + (i % 950) as u32,
            plddt: (i % 9 != 0).then_some((i % 101) as f64),
            supercog: format!("s{}", i % 12),
            taxonomy: (i % 3 == 0).then(|| "Bacteria".to_string()),
            cluster: None,
        });
    }
    Arc::new(builder.build(42))
}

fn engine(table: Arc<PointTable>) -> QueryEngine {
    let terms = TermMembershipCache::new(TermStore::new("/nonexistent-protmap-terms"));
    QueryEngine::new(table, Arc::new(terms))
}

fn labels(items: &[&str]) -> Option<HashSet<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

// ---------------------------------------------------------------------------
// Selectivity
// ---------------------------------------------------------------------------

fn selectivity_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan/selectivity");
    let engine = engine(table(200_000));

    let cases = [
        ("unfiltered", Query::default()),
        (
            "one_type",
            Query {
                types: labels(&["hclust30-clusters"]),
                ..Query::default()
            },
        ),
        (
            "combined",
            Query {
                types: labels(&["mip-clusters", "afdb-clusters-dark"]),
                length: Some(NumericRange::new(100.0, 400.0)),
                plddt: Some(NumericRange::new(70.0, 100.0)),
                taxonomy: labels(&["Bacteria"]),
                ..Query::default()
            },
        ),
        (
            "tiny_box",
            Query {
                bounds: BoundingBox { x0: 0.0, x1: 0.05, y0: 0.0, y1: 0.05 },
                ..Query::default()
            },
        ),
    ];

    for (name, query) in &cases {
        let predicates = engine.compile(query, None);
        group.bench_with_input(BenchmarkId::from_parameter(name), &predicates, |b, p| {
            b.iter(|| black_box(engine.scan(p)))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

fn scaling_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan/scaling");
    group.sample_size(20);

    let query = Query {
        bounds: BoundingBox { x0: -1.0, x1: 1.0, y0: -25.0, y1: 15.0 },
        supercog: labels(&["s1", "s2", "s3"]),
        ..Query::default()
    };

    for rows in [10_000usize, 100_000, 1_000_000] {
        let engine = engine(table(rows));
        let predicates = engine.compile(&query, None);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &predicates, |b, p| {
            b.iter(|| black_box(engine.scan(p)))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

fn batching_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("session/batching");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build tokio runtime");
    let engine = engine(table(100_000));

    for batch in [50usize, 100, 500] {
        group.bench_with_input(BenchmarkId::new("capped_1000", batch), &batch, |b, &batch| {
            b.to_async(&runtime).iter(|| async {
                let records = engine.evaluate(&Query::default()).await.expect("no term filter");
                let batches: Vec<Vec<_>> = records
                    .into_records()
                    .chunks(batch)
                    .map(<[_]>::to_vec)
                    .collect();
                black_box(batches)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, selectivity_bench, scaling_bench, batching_bench);
criterion_main!(benches);
