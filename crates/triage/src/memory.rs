//! Fire-and-forget persistence of finished triage runs.
//!
//! The memory store is an external collaborator: the engine notifies it once
//! per finished run via [`MemorySink::store_tool_execution`] and swallows any
//! failure. Core logic never depends on the outcome.

use async_trait::async_trait;
use tracing::debug;

/// Summary of one finished tool execution, handed to the memory store.
#[derive(Debug, Clone, Default)]
pub struct ExecutionRecord {
    pub tool: String,
    pub args_summary: String,
    pub result_summary: String,
    pub session_id: String,
    pub tags: Vec<String>,
    pub domain: String,
    pub environment: String,
    pub severity: String,
}

#[async_trait]
pub trait MemorySink: Send + Sync {
    /// Store a finished execution. Returns whether the store accepted it;
    /// callers ignore the result beyond logging.
    async fn store_tool_execution(&self, record: &ExecutionRecord) -> bool;
}

/// Default sink that drops records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMemory;

#[async_trait]
impl MemorySink for NoopMemory {
    async fn store_tool_execution(&self, record: &ExecutionRecord) -> bool {
        debug!(tool = %record.tool, "memory store disabled, dropping record");
        true
    }
}
