use serde::{Deserialize, Serialize};

/// Summary statistics for one benchmarked operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchResult {
    pub operation: String,
    pub iterations: u64,

    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub throughput_ops_per_sec: f64,

    pub avg_ram_mb: f64,
    pub gc_pause_ms: f64,
}

/// An operation whose run was abandoned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub operation: String,
    pub iteration: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub profile: String,
    pub iterations: u64,
    pub seed: u64,
    pub mode: String,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run: RunMeta,
    pub results: Vec<BenchResult>,
    pub failures: Vec<Failure>,
}
