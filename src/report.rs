//! Columnar result table and the streaming suite driver.
//!
//! Rows are written as soon as each operation finishes so that earlier
//! results stay visible even if a later operation stops the suite.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{info, warn};

use crate::error::BenchError;
use crate::harness::{FailurePolicy, Runner};
use crate::metrics::MetricsSource;
use crate::operation::Operation;
use crate::schema::{BenchResult, Failure, SuiteReport};

const NAME_WIDTH: usize = 60;
const COL_WIDTH: usize = 20;

pub fn format_header() -> String {
    format!(
        "{:<nw$} {:<cw$} {:<cw$} {:<cw$} {:<cw$} {:<cw$}",
        "Operation",
        "Avg Latency (ms)",
        "P95 Latency (ms)",
        "Throughput (ops/s)",
        "Avg RAM (MB)",
        "GC Pause (ms)",
        nw = NAME_WIDTH,
        cw = COL_WIDTH,
    )
}

pub fn format_row(r: &BenchResult) -> String {
    format!(
        "{:<nw$} {:<cw$.4} {:<cw$.4} {:<cw$.4} {:<cw$.4} {:<cw$.4}",
        r.operation,
        r.avg_latency_ms,
        r.p95_latency_ms,
        r.throughput_ops_per_sec,
        r.avg_ram_mb,
        r.gc_pause_ms,
        nw = NAME_WIDTH,
        cw = COL_WIDTH,
    )
}

pub fn format_failure_row(f: &Failure) -> String {
    format!("{:<nw$} FAILED: {}", f.operation, f.message, nw = NAME_WIDTH)
}

/// Everything a suite produced, in the caller's operation order.
#[derive(Debug, Clone, Default)]
pub struct SuiteOutcome {
    pub results: Vec<BenchResult>,
    pub failures: Vec<Failure>,
}

impl SuiteOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Benchmark each operation in order, streaming one table row per operation
/// to `out`.
///
/// Under [`FailurePolicy::Abort`] the first failing operation ends the suite
/// with its error and nothing after it runs. Under
/// [`FailurePolicy::Continue`] the failure is printed as its own row and
/// recorded in the outcome.
pub fn run_suite<M, W>(
    runner: &Runner<M>,
    operations: &mut [Box<dyn Operation>],
    iterations: u64,
    policy: FailurePolicy,
    out: &mut W,
) -> Result<SuiteOutcome, BenchError>
where
    M: MetricsSource,
    W: Write,
{
    if iterations == 0 {
        return Err(BenchError::InvalidIterations);
    }
    info!(operations = operations.len(), iterations, ?policy, "running suite");

    writeln!(out, "{}", format_header())?;
    out.flush()?;

    let mut outcome = SuiteOutcome::default();
    for op in operations.iter_mut() {
        match runner.run(&mut **op, iterations) {
            Ok(result) => {
                writeln!(out, "{}", format_row(&result))?;
                outcome.results.push(result);
            }
            Err(BenchError::Operation {
                name,
                iteration,
                source,
            }) => {
                if policy == FailurePolicy::Abort {
                    return Err(BenchError::Operation {
                        name,
                        iteration,
                        source,
                    });
                }
                warn!(operation = %name, iteration, error = %source, "operation failed, skipping");
                let failure = Failure {
                    operation: name,
                    iteration,
                    message: source.to_string(),
                };
                writeln!(out, "{}", format_failure_row(&failure))?;
                outcome.failures.push(failure);
            }
            Err(other) => return Err(other),
        }
        out.flush()?;
    }

    info!(
        succeeded = outcome.results.len(),
        failed = outcome.failures.len(),
        "suite finished"
    );
    Ok(outcome)
}

/// Write the JSON report to `path`, or stdout if `None`.
pub fn write_json(report: &SuiteReport, path: Option<&Path>) -> Result<(), BenchError> {
    let json = serde_json::to_string_pretty(report)?;
    match path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
