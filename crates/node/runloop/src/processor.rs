//! Single-block state machine.

use std::{
    fmt,
    time::{Duration, Instant},
};

use alloy_consensus::TxEnvelope;
use alloy_primitives::{Address, B256};
use rayon::ThreadPool;
use strata_domain::{AddressSet, Ancestors, Block, BlockId};
use strata_executor::{
    BlockExecutor, BlockHashBuffer, BlockMetrics, Chain, ChainContext, ExecEvent, ExecEventSink,
    ExecutionInput, NoopSink, RevertInput, RevisionPolicy, TxStateView, recover_block,
    validate_block, validate_body, validate_output_header,
};
use strata_traits::{CommitInput, StateStore};
use tracing::{info, trace, warn};

use crate::{BlockError, RunloopError};

/// Commits slower than this are reported as a performance warning.
pub const SLOW_COMMIT_THRESHOLD: Duration = Duration::from_millis(500);

/// Stages a block moves through, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Static header and body validation.
    Validating,
    /// Sender and authority recovery plus sender-dependent validation.
    Recovering,
    /// Speculative transaction execution.
    Executing,
    /// Persisting the overlay and computing roots.
    Committing,
    /// Comparing committed roots with the declared header.
    PostValidating,
    /// Marking the block final and publishing telemetry.
    Finalized,
}

impl Stage {
    /// Lowercase stage name used in logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Recovering => "recovering",
            Self::Executing => "executing",
            Self::Committing => "committing",
            Self::PostValidating => "post-validating",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a finalized block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessedBlock {
    /// Block height.
    pub height: u64,
    /// Hash of the committed header.
    pub hash: B256,
    /// Transactions executed.
    pub transactions: u64,
    /// Gas used.
    pub gas_used: u64,
    /// Speculative retries.
    pub retries: u64,
    /// Transaction execution time as reported by the engine, or the wall time of the
    /// whole execution call when the engine reports none.
    pub exec_time: Duration,
}

/// Runs one block at a time through validation, recovery, execution, commit,
/// post-validation and finalization.
///
/// The processor borrows the state store and owns the ancestor hash buffer, which it
/// appends to strictly in height order.
pub struct BlockProcessor<'a, C, S, E> {
    chain: &'a C,
    state: &'a mut S,
    executor: &'a E,
    pool: &'a ThreadPool,
    sink: &'a dyn ExecEventSink,
    block_hashes: BlockHashBuffer,
    enable_tracing: bool,
}

impl<C, S, E> fmt::Debug for BlockProcessor<'_, C, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockProcessor")
            .field("next_height", &self.block_hashes.next_height())
            .field("enable_tracing", &self.enable_tracing)
            .finish_non_exhaustive()
    }
}

impl<'a, C, S, E> BlockProcessor<'a, C, S, E>
where
    C: Chain,
    S: StateStore,
    E: BlockExecutor<S>,
{
    /// Create a processor that publishes no events and does not trace calls.
    pub fn new(chain: &'a C, state: &'a mut S, executor: &'a E, pool: &'a ThreadPool) -> Self {
        Self {
            chain,
            state,
            executor,
            pool,
            sink: &NoopSink,
            block_hashes: BlockHashBuffer::new(),
            enable_tracing: false,
        }
    }

    /// Publish execution events to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: &'a dyn ExecEventSink) -> Self {
        self.sink = sink;
        self
    }

    /// Record call frames for every transaction.
    #[must_use]
    pub const fn with_tracing(mut self, enable_tracing: bool) -> Self {
        self.enable_tracing = enable_tracing;
        self
    }

    /// Use a pre-populated ancestor hash buffer.
    #[must_use]
    pub fn with_block_hashes(mut self, block_hashes: BlockHashBuffer) -> Self {
        self.block_hashes = block_hashes;
        self
    }

    /// The chain policy.
    pub const fn chain(&self) -> &'a C {
        self.chain
    }

    /// The ancestor hash buffer.
    pub const fn block_hashes(&self) -> &BlockHashBuffer {
        &self.block_hashes
    }

    /// Make the ancestor hash buffer continue at `height`.
    ///
    /// An empty buffer is restarted there. A buffer holding hashes that would leave a gap
    /// is rejected instead of discarded.
    pub(crate) fn align_block_hashes(&mut self, height: u64) -> Result<(), RunloopError> {
        let next = self.block_hashes.next_height();
        if next == height {
            return Ok(());
        }
        if !self.block_hashes.is_empty() {
            warn!(next, start = height, "block hash buffer does not continue at start height");
            return Err(RunloopError::MisalignedBlockHashes { next, start: height });
        }
        self.block_hashes = BlockHashBuffer::starting_at(height);
        Ok(())
    }

    /// Run `block` through every stage under revision `R`.
    ///
    /// Once recovery succeeds, the block's address set is written to `out` so the caller
    /// can slide its window even if a later stage fails. Nothing is committed unless
    /// recovery and execution succeed.
    pub fn process<R: RevisionPolicy>(
        &mut self,
        block: &mut Block,
        id: BlockId,
        parent_id: BlockId,
        ancestors: Ancestors<'_>,
        out: &mut Option<AddressSet>,
    ) -> Result<ProcessedBlock, BlockError> {
        let start = Instant::now();
        let height = block.header.number;
        let tx_count = block.body.transactions.len();

        trace!(height, stage = %Stage::Validating);
        self.chain.static_validate_header(&block.header)?;
        validate_block::<R>(block)?;
        self.sink.record(&ExecEvent::BlockStart {
            number: height,
            timestamp: block.header.timestamp,
            tx_count: u32::try_from(tx_count).unwrap_or(u32::MAX),
        });

        trace!(height, stage = %Stage::Recovering);
        let recovery_start = Instant::now();
        let recovered = recover_block(&block.body.transactions, self.pool);
        let senders = recovered.senders()?;
        let set = AddressSet::from_recovered(&senders, &recovered.authorities);
        let current: &AddressSet = out.insert(set);
        validate_body::<R>(&senders, &block.body.transactions)?;
        let context = ChainContext::new(ancestors, current, &senders, &recovered.authorities);
        let recovery_elapsed = recovery_start.elapsed();

        trace!(height, stage = %Stage::Executing);
        let parent_height = height.saturating_sub(1);
        self.state
            .set_block_and_prefix(parent_height, parent_id)
            .map_err(BlockError::store(Stage::Executing))?;
        let parent = self.state.read_header().map_err(BlockError::store(Stage::Executing))?;
        block.header.parent_hash = parent.hash_slow();

        let metrics = BlockMetrics::new();
        let chain = self.chain;
        let header = &block.header;
        let base_fee = header.base_fee_per_gas.unwrap_or_default();
        let revert = |sender: &Address, tx: &TxEnvelope, index: usize, view: &dyn TxStateView| {
            let input = RevertInput {
                block_number: header.number,
                timestamp: header.timestamp,
                sender: *sender,
                tx,
                base_fee,
                index,
            };
            chain.revert_transaction(&input, view, &context)
        };
        let input = ExecutionInput {
            block: &*block,
            senders: &senders,
            authorities: &recovered.authorities,
            block_hashes: &self.block_hashes,
            pool: self.pool,
            enable_tracing: self.enable_tracing,
        };
        let exec_start = Instant::now();
        let output = self.executor.execute_block::<R>(input, &*self.state, &metrics, &revert)?;
        if metrics.tx_exec_time().is_zero() {
            metrics.set_tx_exec_time(exec_start.elapsed());
        }

        trace!(height, stage = %Stage::Committing);
        let commit_start = Instant::now();
        self.state
            .commit(
                output.overlay,
                CommitInput {
                    id,
                    header: &block.header,
                    receipts: &output.receipts,
                    call_frames: &output.call_frames,
                    senders: &senders,
                    transactions: &block.body.transactions,
                    ommers: &block.body.ommers,
                    withdrawals: block.body.withdrawals.as_ref(),
                },
            )
            .map_err(BlockError::store(Stage::Committing))?;
        let commit_elapsed = commit_start.elapsed();
        if commit_elapsed > SLOW_COMMIT_THRESHOLD {
            warn!(height, commit_ms = commit_elapsed.as_millis(), "slow block commit");
        }

        trace!(height, stage = %Stage::PostValidating);
        let committed =
            self.state.read_header().map_err(BlockError::store(Stage::PostValidating))?;
        validate_output_header(&block.header, &committed)?;

        trace!(height, stage = %Stage::Finalized);
        self.state.finalize(height, id).map_err(BlockError::store(Stage::Finalized))?;
        self.state.update_verified_block(height).map_err(BlockError::store(Stage::Finalized))?;
        let hash = committed.hash_slow();
        self.block_hashes.set(height, hash)?;

        let processed = ProcessedBlock {
            height,
            hash,
            transactions: tx_count as u64,
            gas_used: committed.gas_used,
            retries: metrics.num_retries(),
            exec_time: metrics.tx_exec_time(),
        };
        self.report(
            &processed,
            block.header.timestamp,
            recovery_elapsed,
            commit_elapsed,
            start.elapsed(),
        );
        Ok(processed)
    }

    fn report(
        &self,
        block: &ProcessedBlock,
        timestamp: u64,
        recovery: Duration,
        commit: Duration,
        total: Duration,
    ) {
        let exec = block.exec_time;
        let retry_pct = if block.transactions == 0 {
            0.0
        } else {
            block.retries as f64 * 100.0 / block.transactions as f64
        };
        let exec_us = exec.as_micros().max(1) as u64;
        let total_us = total.as_micros().max(1) as u64;
        info!(
            target: "strata::exec_block",
            block = block.height,
            hash = %block.hash,
            timestamp,
            txs = block.transactions,
            retries = block.retries,
            retry_pct,
            recovery_us = recovery.as_micros() as u64,
            exec_us = exec.as_micros() as u64,
            commit_us = commit.as_micros() as u64,
            total_us = total.as_micros() as u64,
            tps_exec = block.transactions * 1_000_000 / exec_us,
            tps = block.transactions * 1_000_000 / total_us,
            gas = block.gas_used,
            gps_exec = block.gas_used / exec_us,
            gps = block.gas_used / total_us,
            store = self.state.stats().as_deref().unwrap_or(""),
            "executed block"
        );
        self.sink.record(&ExecEvent::BlockFinalized {
            number: block.height,
            hash: block.hash,
            gas_used: block.gas_used,
            tx_count: u32::try_from(block.transactions).unwrap_or(u32::MAX),
            retries: block.retries,
            elapsed: total,
        });
    }
}
