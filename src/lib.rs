pub mod error;
pub mod harness;
pub mod metrics;
pub mod operation;
pub mod report;
pub mod schema;
pub mod workloads;

pub use error::BenchError;
pub use harness::{BenchConfig, FailurePolicy, Profile, Runner};
pub use metrics::{AllocatorMetrics, MetricsSource, NoopMetrics, RuntimeSnapshot, TrackingAllocator};
pub use operation::{BoxError, FnOperation, Operation};
pub use report::{run_suite, SuiteOutcome};
pub use schema::BenchResult;
