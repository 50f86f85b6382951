//! Harness overhead benchmark suite
//!
//! Measures what the runner itself costs on top of the measured work:
//! - Statistics derivation over timing samples of various sizes
//! - The per-iteration loop around a no-op operation
//! - The table row formatter

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orm_sql_bench::harness::{Runner, TimingSample};
use orm_sql_bench::metrics::{NoopMetrics, RuntimeSnapshot};
use orm_sql_bench::operation::FnOperation;
use orm_sql_bench::report::format_row;
use std::time::Duration;

fn sample_of(n: u64) -> TimingSample {
    let mut t = TimingSample::with_capacity(n as usize);
    // Descending so the sort does real work.
    for i in (0..n).rev() {
        t.push(Duration::from_nanos(1_000 + (i * 7_919) % 50_000));
    }
    t
}

/// Benchmark summary statistics at various sample sizes
fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    for n in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
            bencher.iter_with_setup(
                || sample_of(n),
                |t| black_box(t.summarize("op", RuntimeSnapshot::default())),
            )
        });
    }

    group.finish();
}

/// Benchmark the runner loop around an operation that does nothing
fn bench_runner_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("runner_loop");
    let runner = Runner::new(NoopMetrics);

    for n in [1_000u64, 10_000] {
        group.bench_with_input(BenchmarkId::new("noop", n), &n, |bencher, &n| {
            let mut op = FnOperation::new("noop", |i| {
                black_box(i);
                Ok(())
            });
            bencher.iter(|| black_box(runner.run(&mut op, n)))
        });
    }

    group.finish();
}

fn bench_format_row(c: &mut Criterion) {
    let result = sample_of(1_000)
        .summarize("Get Order Full Details by ID (Nested Preload)", RuntimeSnapshot::default())
        .expect("non-empty sample");

    c.bench_function("format_row", |bencher| {
        bencher.iter(|| format_row(black_box(&result)))
    });
}

criterion_group!(benches, bench_summarize, bench_runner_loop, bench_format_row);
criterion_main!(benches);
