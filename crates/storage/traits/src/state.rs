//! Persistent state store contract.

use alloy_consensus::{Receipt, TxEnvelope};
use alloy_eips::eip4895::Withdrawals;
use alloy_primitives::{Address, Log};
use strata_domain::{BlockId, CallFrame, Header};

use crate::StoreError;

/// Everything the state store persists alongside a block's state changes.
#[derive(Clone, Copy, Debug)]
pub struct CommitInput<'a> {
    /// Identifier of the block being committed.
    pub id: BlockId,
    /// Declared header of the block.
    pub header: &'a Header,
    /// One receipt per transaction, in block order.
    pub receipts: &'a [Receipt<Log>],
    /// Call traces per transaction; empty frames when tracing is disabled.
    pub call_frames: &'a [Vec<CallFrame>],
    /// Recovered sender per transaction.
    pub senders: &'a [Address],
    /// The block's transactions.
    pub transactions: &'a [TxEnvelope],
    /// The block's ommer headers.
    pub ommers: &'a [Header],
    /// The block's withdrawals, if the block carries any.
    pub withdrawals: Option<&'a Withdrawals>,
}

/// Persistent state storage.
///
/// The store owns the trie and computes every Merkle commitment as part of
/// [`StateStore::commit`]; the header it reports afterwards carries those roots.
pub trait StateStore {
    /// Block-scoped overlay produced by execution and consumed by commit.
    type Overlay;

    /// Select the block whose post-state subsequent reads and commits build upon.
    fn set_block_and_prefix(&mut self, height: u64, id: BlockId) -> Result<(), StoreError>;

    /// Read the header of the currently selected block.
    fn read_header(&self) -> Result<Header, StoreError>;

    /// Persist an execution overlay together with the block's artifacts.
    fn commit(&mut self, overlay: Self::Overlay, input: CommitInput<'_>) -> Result<(), StoreError>;

    /// Mark the block at `height` as the finalized tip.
    fn finalize(&mut self, height: u64, id: BlockId) -> Result<(), StoreError>;

    /// Record `height` as the latest block whose output has been verified.
    fn update_verified_block(&mut self, height: u64) -> Result<(), StoreError>;

    /// Engine statistics appended to per-block telemetry.
    fn stats(&self) -> Option<String> {
        None
    }
}
