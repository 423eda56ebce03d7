//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// The cluster command executor failed (spawn failure, non-zero exit,
    /// retries exhausted). Checks treat this as "this check failed", never as
    /// a process-fatal condition.
    #[error("cluster command `{command}` failed: {message}")]
    Exec { command: String, message: String },

    /// A cluster command exceeded its per-call timeout.
    #[error("cluster command `{command}` timed out after {timeout_ms}ms")]
    ExecTimeout { command: String, timeout_ms: u64 },

    /// The executor returned stdout that was not valid JSON for the resource.
    #[error("failed to parse {resource} listing: {source}")]
    Parse {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Dedicated short-circuit for a missing or inaccessible namespace.
    #[error("namespace {0} does not exist or is not accessible")]
    NamespaceNotFound(String),
}

pub type Result<T> = std::result::Result<T, TriageError>;
