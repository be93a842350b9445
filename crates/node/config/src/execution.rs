//! Execution configuration.

use serde::{Deserialize, Serialize};

/// Default size of the recovery and execution worker pool.
pub const DEFAULT_THREADS: usize = 4;

/// Default blocks per throughput log line when replaying to a fixed height.
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Execution layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Worker threads for sender recovery and transaction execution.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Record call frames for every transaction.
    #[serde(default)]
    pub enable_tracing: bool,

    /// Blocks per throughput log line for bounded runs.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { threads: DEFAULT_THREADS, enable_tracing: false, batch_size: DEFAULT_BATCH_SIZE }
    }
}

const fn default_threads() -> usize {
    DEFAULT_THREADS
}

const fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}
