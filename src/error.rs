use thiserror::Error;

use crate::operation::BoxError;

/// Errors surfaced by the benchmark runner and reporter.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A run was requested with zero iterations.
    #[error("iteration count must be at least 1")]
    InvalidIterations,

    /// An operation's `execute` call failed; the run for that operation is void.
    #[error("failed to execute operation \"{name}\" (iteration {iteration}): {source}")]
    Operation {
        name: String,
        iteration: u64,
        #[source]
        source: BoxError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_names_operation_and_cause() {
        let err = BenchError::Operation {
            name: "Create Product".to_string(),
            iteration: 3,
            source: "UNIQUE constraint failed".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"Create Product\""));
        assert!(msg.contains("iteration 3"));
        assert!(msg.contains("UNIQUE constraint failed"));
    }
}
