//! Benchmarks for filter flattening and query building.
//!
//! Run with: cargo bench -p asset-query

use asset_query::{Query, Whitelist, build_query, flatten};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

fn sample_filters() -> Vec<(&'static str, Value)> {
    vec![
        ("single", json!({ "name": "gundam" })),
        (
            "nested_range",
            json!({ "model": { "triCount": { "gte": "1000", "lte": 5000 } } }),
        ),
        (
            "mixed",
            json!({
                "name": ["Gundam", "Robot", "Mech"],
                "fileSize": 5,
                "texture": { "resolution": { "gte": 512, "lte": 4096 } },
                "license": "cc0"
            }),
        ),
    ]
}

// =============================================================================
// Flattening Benchmarks
// =============================================================================

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for (name, filter) in sample_filters() {
        group.bench_with_input(BenchmarkId::new("object", name), &filter, |b, f| {
            b.iter(|| flatten(black_box(f)))
        });
    }

    group.finish();
}

// =============================================================================
// Whitelist and Query Builder Benchmarks
// =============================================================================

fn bench_query_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder");
    let whitelist = Whitelist::new([
        "name",
        "fileSize",
        "license",
        "model.triCount.gte",
        "model.triCount.lte",
        "texture.resolution.gte",
        "texture.resolution.lte",
    ]);

    for (name, filter) in sample_filters() {
        let flat = flatten(&filter);
        group.bench_with_input(BenchmarkId::new("is_allowed", name), &flat, |b, f| {
            b.iter(|| whitelist.is_allowed(black_box(f)))
        });
        group.bench_with_input(BenchmarkId::new("build", name), &flat, |b, f| {
            b.iter(|| build_query(black_box(f)))
        });
    }

    let query = build_query(&flatten(&json!({
        "name": ["Gundam", "Robot"],
        "model": { "triCount": { "gte": 100, "lte": 5000 } }
    })));
    let rendered = query.to_json();
    group.bench_function("render", |b| b.iter(|| black_box(&query).to_json()));
    group.bench_function("parse", |b| {
        b.iter(|| Query::from_json(black_box(&rendered)))
    });

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_query_builder);
criterion_main!(benches);
