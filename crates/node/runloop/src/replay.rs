//! Height-ordered replay loop with throughput batching.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{ProcessedBlock, RunloopError, ThroughputBatch, batch_size_for};

/// Totals for one replay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Blocks completed.
    pub blocks: u64,
    /// Transactions in completed blocks.
    pub transactions: u64,
    /// Gas used by completed blocks.
    pub gas: u64,
    /// Block count of each throughput batch logged, in order.
    pub batches: Vec<u64>,
}

/// Throughput contribution of one completed block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockTally {
    /// Transactions in the block.
    pub transactions: u64,
    /// Gas used by the block.
    pub gas: u64,
}

impl From<ProcessedBlock> for BlockTally {
    fn from(block: ProcessedBlock) -> Self {
        Self { transactions: block.transactions, gas: block.gas_used }
    }
}

/// Feed heights from `*next_height` through `until` to `step` until `stop` is set.
///
/// `step` returns `None` to end the replay early without error. `stop` is sampled before
/// each height and `next_height` advances past every completed block. Batches hold
/// `batch_size_for(until, bounded_batch)` blocks; the trailing partial batch is logged
/// only when the replay ends without error.
pub fn replay<F>(
    next_height: &mut u64,
    until: Option<u64>,
    bounded_batch: u64,
    stop: &AtomicUsize,
    mut step: F,
) -> Result<RunSummary, RunloopError>
where
    F: FnMut(u64) -> Result<Option<BlockTally>, RunloopError>,
{
    let batch_size = batch_size_for(until, bounded_batch);
    let mut batch = ThroughputBatch::new();
    let mut summary = RunSummary::default();

    while until.is_none_or(|end| *next_height <= end) && stop.load(Ordering::Acquire) == 0 {
        let height = *next_height;
        let Some(tally) = step(height)? else {
            break;
        };

        summary.blocks += 1;
        summary.transactions += tally.transactions;
        summary.gas += tally.gas;
        batch.record(height, tally.transactions, tally.gas);
        if batch.blocks() >= batch_size
            && let Some(blocks) = batch.flush()
        {
            summary.batches.push(blocks);
        }
        *next_height = height + 1;
    }

    summary.batches.extend(batch.flush());
    Ok(summary)
}
