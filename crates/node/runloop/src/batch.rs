//! Throughput accounting across groups of blocks.

use std::time::Instant;

use strata_sys::ResidentMemory;
use tracing::info;

/// Blocks per throughput log line when replaying up to a fixed height.
pub const BOUNDED_BATCH_SIZE: u64 = 1000;

/// Batch size for a run: one block per line when following the tip, otherwise
/// `bounded` blocks per line.
pub const fn batch_size_for(until: Option<u64>, bounded: u64) -> u64 {
    match until {
        None => 1,
        Some(_) if bounded == 0 => 1,
        Some(_) => bounded,
    }
}

/// Accumulated throughput of the blocks finalized since the last flush.
#[derive(Debug)]
pub struct ThroughputBatch {
    blocks: u64,
    transactions: u64,
    gas: u64,
    last_height: u64,
    started: Instant,
}

impl Default for ThroughputBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ThroughputBatch {
    /// Start an empty batch.
    pub fn new() -> Self {
        Self { blocks: 0, transactions: 0, gas: 0, last_height: 0, started: Instant::now() }
    }

    /// Add a finalized block.
    pub const fn record(&mut self, height: u64, transactions: u64, gas: u64) {
        self.blocks += 1;
        self.transactions += transactions;
        self.gas += gas;
        self.last_height = height;
    }

    /// Blocks recorded since the last flush.
    pub const fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Returns true if no block was recorded since the last flush.
    pub const fn is_empty(&self) -> bool {
        self.blocks == 0
    }

    /// Log the batch and start a new one, returning how many blocks it held.
    ///
    /// An empty batch is not logged and yields `None`.
    pub fn flush(&mut self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        let blocks = self.blocks;
        let elapsed_us = self.started.elapsed().as_micros().max(1) as u64;
        info!(
            blocks = self.blocks,
            last = self.last_height,
            txs = self.transactions,
            tps = self.transactions * 1_000_000 / elapsed_us,
            gas_m = self.gas / 1_000_000,
            mgps = self.gas / elapsed_us,
            rss_mb = ResidentMemory::new().megabytes(),
            "run progress"
        );
        *self = Self::new();
        Some(blocks)
    }
}
