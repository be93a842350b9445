//! Runloop driver: pulls blocks from the block store and feeds them to the processor.

use std::sync::atomic::AtomicUsize;

use rayon::ThreadPool;
use strata_domain::{AddressSet, AddressWindow, BlockId};
use strata_executor::{
    BlockExecutor, Chain, Revision, RevisionOne, RevisionThree, RevisionTwo, RevisionZero,
    recover_block,
};
use strata_traits::{BlockStore, StateStore};
use tracing::{debug, info};

use crate::{
    BOUNDED_BATCH_SIZE, BlockError, BlockProcessor, BlockTally, ProcessedBlock, RunSummary,
    RunloopError, batch_size_for, replay,
};

/// Drives blocks from a [`BlockStore`] through a [`BlockProcessor`] in height order.
pub struct Runloop<'a, C, L, S, E> {
    processor: BlockProcessor<'a, C, S, E>,
    ledger: &'a L,
    pool: &'a ThreadPool,
    batch_size: u64,
}

impl<C, L, S, E> std::fmt::Debug for Runloop<'_, C, L, S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runloop")
            .field("processor", &self.processor)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl<'a, C, L, S, E> Runloop<'a, C, L, S, E>
where
    C: Chain,
    L: BlockStore,
    S: StateStore,
    E: BlockExecutor<S>,
{
    /// Create a driver around `processor` reading blocks from `ledger`.
    pub const fn new(
        processor: BlockProcessor<'a, C, S, E>,
        ledger: &'a L,
        pool: &'a ThreadPool,
    ) -> Self {
        Self { processor, ledger, pool, batch_size: BOUNDED_BATCH_SIZE }
    }

    /// Blocks per throughput log line for bounded runs.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// The underlying processor.
    pub const fn processor(&self) -> &BlockProcessor<'a, C, S, E> {
        &self.processor
    }

    /// Process blocks from `*next_height` through `until`, or until `stop` is set.
    ///
    /// `stop` is sampled before each block; a started block always runs to completion
    /// or failure. `next_height` advances past every finalized block, so on error it
    /// names the height that failed. A non-empty ancestor hash buffer that does not
    /// continue at `*next_height` is rejected before any block runs.
    pub fn run(
        &mut self,
        next_height: &mut u64,
        until: Option<u64>,
        stop: &AtomicUsize,
    ) -> Result<RunSummary, RunloopError> {
        let mut window = self.bootstrap(*next_height)?;
        self.processor.align_block_hashes(*next_height)?;
        let batch_size = batch_size_for(until, self.batch_size);
        info!(start = *next_height, ?until, batch_size, "starting runloop");

        let summary = replay(next_height, until, self.batch_size, stop, |height| {
            let mut out = None;
            let result = self.step(height, &window, &mut out);
            if let Some(set) = out {
                window.slide(set);
            }
            result.map(|processed| Some(BlockTally::from(processed)))
        })?;

        info!(next = *next_height, blocks = summary.blocks, "runloop stopped");
        Ok(summary)
    }

    fn step(
        &mut self,
        height: u64,
        window: &AddressWindow,
        out: &mut Option<AddressSet>,
    ) -> Result<ProcessedBlock, RunloopError> {
        let mut block = self.ledger.get(height)?.ok_or(RunloopError::MissingBlock(height))?;
        let id = BlockId::from_height(height);
        let parent_id = BlockId::parent_of(height);
        let ancestors = window.ancestors();
        let revision = self.processor.chain().revision(block.header.timestamp);
        let processor = &mut self.processor;
        let block = &mut block;
        let result: Result<_, BlockError> = match revision {
            Revision::Zero => processor.process::<RevisionZero>(block, id, parent_id, ancestors, out),
            Revision::One => processor.process::<RevisionOne>(block, id, parent_id, ancestors, out),
            Revision::Two => processor.process::<RevisionTwo>(block, id, parent_id, ancestors, out),
            Revision::Three => {
                processor.process::<RevisionThree>(block, id, parent_id, ancestors, out)
            }
        };
        result.map_err(|source| RunloopError::Block { height, source })
    }

    /// Recover the one or two blocks preceding `start` to warm the address window.
    ///
    /// Unrecoverable senders are skipped; these blocks are already final.
    pub fn bootstrap(&self, start: u64) -> Result<AddressWindow, RunloopError> {
        let mut window = AddressWindow::new();
        let first = start.saturating_sub(2).max(1);
        for height in first..start {
            let block = self.ledger.get(height)?.ok_or(RunloopError::MissingBlock(height))?;
            let recovered = recover_block(&block.body.transactions, self.pool);
            let senders = recovered.senders.iter().flatten();
            let set = AddressSet::from_recovered(senders, &recovered.authorities);
            debug!(height, addresses = set.len(), "bootstrapped address window");
            window.slide(set);
        }
        Ok(window)
    }
}
