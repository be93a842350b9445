//! Per-block execution metrics.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// Counters scoped to one block's execution.
///
/// Shared by reference across execution workers, then read once for telemetry.
#[derive(Debug, Default)]
pub struct BlockMetrics {
    retries: AtomicU64,
    tx_exec_micros: AtomicU64,
}

impl BlockMetrics {
    /// Fresh metrics for a new block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one speculative retry.
    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of speculative retries so far.
    pub fn num_retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Overwrite the time spent executing transactions.
    pub fn set_tx_exec_time(&self, elapsed: Duration) {
        self.tx_exec_micros.store(micros(elapsed), Ordering::Relaxed);
    }

    /// Add to the time spent executing transactions.
    ///
    /// Engines call this once per transaction, possibly from several workers.
    pub fn add_tx_exec_time(&self, elapsed: Duration) {
        let micros = micros(elapsed);
        let _ = self.tx_exec_micros.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
            Some(total.saturating_add(micros))
        });
    }

    /// Wall time spent executing transactions.
    pub fn tx_exec_time(&self) -> Duration {
        Duration::from_micros(self.tx_exec_micros.load(Ordering::Relaxed))
    }
}

fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}
