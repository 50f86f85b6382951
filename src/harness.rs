use std::hint::black_box;
use std::time::{Duration, Instant};

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::BenchError;
use crate::metrics::{AllocatorMetrics, MetricsSource, RuntimeSnapshot};
use crate::operation::Operation;
use crate::schema::BenchResult;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const NANOS_PER_MS: f64 = 1e6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }

    pub fn iters(&self) -> u64 {
        match self {
            Profile::Quick => 1_000,
            Profile::Full => 10_000,
        }
    }
}

/// What the suite does when an operation fails mid-run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Drop the failing operation's run and benchmark the rest.
    #[default]
    Continue,
    /// Stop the suite at the first failure.
    Abort,
}

#[derive(Clone, Debug, Default)]
pub struct BenchConfig {
    pub profile: Profile,
    /// Overrides the profile's iteration count when set.
    pub iterations: Option<u64>,
    pub seed: u64,
    pub failure_policy: FailurePolicy,
}

impl BenchConfig {
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    pub fn iters(&self) -> u64 {
        self.iterations.unwrap_or_else(|| self.profile.iters())
    }
}

/// Zero-based index of the `pct`-th percentile in `len` ascending samples,
/// by nearest rank: `max(ceil(pct/100 * len) - 1, 0)`.
pub fn nearest_rank_index(len: usize, pct: u64) -> usize {
    let rank = (len as u128 * pct as u128).div_ceil(100);
    (rank as usize).saturating_sub(1).min(len.saturating_sub(1))
}

/// Per-call elapsed times of one run, in invocation order.
#[derive(Clone, Debug, Default)]
pub struct TimingSample {
    samples: Vec<Duration>,
}

impl TimingSample {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, elapsed: Duration) {
        self.samples.push(elapsed);
    }

    /// Sum of all per-call times.
    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    /// Derive the summary record. `delta` is the counter growth over the run.
    pub fn summarize(
        mut self,
        operation: &str,
        delta: RuntimeSnapshot,
    ) -> Result<BenchResult, BenchError> {
        if self.samples.is_empty() {
            return Err(BenchError::InvalidIterations);
        }
        let n = self.samples.len();
        let total = self.total();

        let avg_latency_ms = total.as_nanos() as f64 / n as f64 / NANOS_PER_MS;

        self.samples.sort_unstable();
        let p95 = self.samples[nearest_rank_index(n, 95)];
        let p95_latency_ms = p95.as_nanos() as f64 / NANOS_PER_MS;

        // Summed per-call time, not loop wall time.
        let throughput_ops_per_sec = n as f64 / total.as_secs_f64();

        let avg_ram_mb = delta.bytes_allocated as f64 / n as f64 / BYTES_PER_MB;
        let gc_pause_ms = delta.gc_pause_ns as f64 / NANOS_PER_MS;

        Ok(BenchResult {
            operation: operation.to_string(),
            iterations: n as u64,
            avg_latency_ms,
            p95_latency_ms,
            throughput_ops_per_sec,
            avg_ram_mb,
            gc_pause_ms,
        })
    }
}

/// Runs one operation `iterations` times back to back and summarizes it.
#[derive(Debug, Clone, Default)]
pub struct Runner<M = AllocatorMetrics> {
    metrics: M,
}

impl<M: MetricsSource> Runner<M> {
    pub fn new(metrics: M) -> Self {
        Self { metrics }
    }

    /// Execute `op` for iterations `0..iterations`.
    ///
    /// The first failing call voids the run: no partial result is returned.
    pub fn run(
        &self,
        op: &mut dyn Operation,
        iterations: u64,
    ) -> Result<BenchResult, BenchError> {
        if iterations == 0 {
            return Err(BenchError::InvalidIterations);
        }
        debug!(operation = op.name(), iterations, "starting run");

        let mut timings = TimingSample::with_capacity(iterations as usize);

        self.metrics.collect();
        let snapshot_start = self.metrics.snapshot();

        for i in 0..iterations {
            let start = Instant::now();
            let outcome = op.execute(black_box(i));
            let elapsed = start.elapsed();

            if let Err(source) = outcome {
                return Err(BenchError::Operation {
                    name: op.name().to_string(),
                    iteration: i,
                    source,
                });
            }
            timings.push(elapsed);
        }

        let snapshot_end = self.metrics.snapshot();

        let result = timings.summarize(op.name(), snapshot_end.since(&snapshot_start))?;
        debug!(
            operation = %result.operation,
            avg_latency_ms = result.avg_latency_ms,
            p95_latency_ms = result.p95_latency_ms,
            "finished run"
        );
        Ok(result)
    }
}
