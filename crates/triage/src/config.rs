//! Engine configuration.

use std::time::Duration;

/// Tunables for a triage invocation.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Maximum checks running concurrently within one checklist batch.
    /// Batches larger than this are processed in successive waves.
    pub max_concurrent_checks: usize,
    /// Default overall budget for a full checklist run.
    pub max_check_time: Duration,
    /// Timeout for the optional route reachability probe.
    pub probe_timeout: Duration,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: 8,
            max_check_time: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
        }
    }
}
