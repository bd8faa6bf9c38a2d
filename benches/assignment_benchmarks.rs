//! Assignment hot-path benchmarks
//!
//! Assignment must complete in sub-millisecond time; these benches keep an
//! eye on the hash + gate + bucket pipeline as it evolves.
//!
//! Run with: cargo bench --bench assignment_benchmarks

use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cohort::assignment::{bucket_point, fnv1a, traffic_position, AssignmentEngine};
use cohort::clock::FixedClock;
use cohort::experiment::{
    Experiment, ExperimentStatus, ExperimentStore, MetricDef, Variant, VariantRole,
};
use cohort::ledger::MemoryLedger;
use cohort::stats::MetricKind;

const SMALL_POPULATION: usize = 1_000;
const LARGE_POPULATION: usize = 100_000;

fn engine() -> AssignmentEngine {
    let store = Arc::new(ExperimentStore::new());
    store
        .put(
            Experiment::builder("exp-bench", "Benchmark")
                .variant(Variant::new("control", VariantRole::Control, 0.5))
                .variant(Variant::new("treatment", VariantRole::Treatment, 0.5))
                .metric(MetricDef::primary("conversion", MetricKind::Proportion, "signup"))
                .build(),
        )
        .unwrap();
    store
        .transition("exp-bench", ExperimentStatus::Active)
        .unwrap();
    AssignmentEngine::new(
        store,
        Arc::new(MemoryLedger::new()),
        Arc::new(FixedClock(Utc::now())),
    )
}

/// Benchmark the raw bucketing hashes
fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucketing_hashes");

    group.bench_function("fnv1a_user_id", |b| {
        b.iter(|| fnv1a(black_box(b"user-1234567890")));
    });

    group.bench_function("traffic_position", |b| {
        b.iter(|| traffic_position(black_box("user-1234567890")));
    });

    group.bench_function("bucket_point", |b| {
        b.iter(|| bucket_point(black_box("user-1234567890"), black_box("exp-bench")));
    });

    group.finish();
}

/// Benchmark single assignments (the per-request cost)
fn bench_single_assignment(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("single_assignment");

    group.bench_function("assign", |b| {
        b.iter(|| engine.assign(black_box("user-42"), black_box("exp-bench"), None));
    });

    group.finish();
}

/// Benchmark assignment sweeps over synthetic populations
fn bench_population_sweep(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("population_sweep");

    for population in [SMALL_POPULATION, LARGE_POPULATION] {
        let users: Vec<String> = (0..population).map(|i| format!("user-{i}")).collect();
        group.bench_with_input(
            BenchmarkId::new("assign_all", population),
            &users,
            |b, users| {
                b.iter(|| {
                    for user in users {
                        black_box(engine.assign(user, "exp-bench", None));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hashing,
    bench_single_assignment,
    bench_population_sweep
);
criterion_main!(benches);
