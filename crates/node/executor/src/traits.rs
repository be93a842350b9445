//! Core execution traits.

use alloy_consensus::{Receipt, TxEnvelope};
use alloy_primitives::{Address, Log, U256};
use rayon::ThreadPool;
use strata_domain::{Block, CallFrame};
use strata_traits::StateStore;

use crate::{BlockHashBuffer, BlockMetrics, ExecutionError, RevisionPolicy};

/// Account view handed to the revert hook for one transaction's post-execution state.
pub trait TxStateView {
    /// Balance of `address`.
    fn balance(&self, address: &Address) -> U256;
}

/// Per-transaction revert decision supplied by the block processor.
///
/// Called with the sender, the transaction, its index in the block and its
/// post-execution state. Returning `true` makes the engine revert the transaction.
pub type RevertHook<'a> = dyn Fn(&Address, &TxEnvelope, usize, &dyn TxStateView) -> bool + Sync + 'a;

/// Inputs to [`BlockExecutor::execute_block`].
#[derive(Clone, Copy)]
pub struct ExecutionInput<'a> {
    /// The block to execute.
    pub block: &'a Block,
    /// Recovered sender per transaction.
    pub senders: &'a [Address],
    /// Recovered authorities per transaction.
    pub authorities: &'a [Vec<Option<Address>>],
    /// Hashes of recent ancestors, for `BLOCKHASH`.
    pub block_hashes: &'a BlockHashBuffer,
    /// Worker pool to run transactions on.
    pub pool: &'a ThreadPool,
    /// Record call frames for every transaction.
    pub enable_tracing: bool,
}

impl std::fmt::Debug for ExecutionInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionInput")
            .field("block", &self.block.header.number)
            .field("transactions", &self.senders.len())
            .field("enable_tracing", &self.enable_tracing)
            .finish_non_exhaustive()
    }
}

/// Result of executing a block against a state overlay.
#[derive(Debug)]
pub struct BlockOutput<O> {
    /// Block-scoped state changes, consumed by the commit.
    pub overlay: O,
    /// One receipt per transaction, in block order.
    pub receipts: Vec<Receipt<Log>>,
    /// Call frames per transaction; inner vectors are empty when tracing is disabled.
    pub call_frames: Vec<Vec<CallFrame>>,
}

/// Executes a block's transactions against a state store.
///
/// Implementations may execute transactions speculatively and in parallel, but receipts
/// and the resulting overlay must equal those of sequential, in-order execution.
pub trait BlockExecutor<S: StateStore>: Send + Sync {
    /// Execute every transaction of `input.block` under revision `R`.
    ///
    /// Conflict retries are counted in `metrics`, not reported as errors.
    fn execute_block<R: RevisionPolicy>(
        &self,
        input: ExecutionInput<'_>,
        state: &S,
        metrics: &BlockMetrics,
        revert: &RevertHook<'_>,
    ) -> Result<BlockOutput<S::Overlay>, ExecutionError>;
}
