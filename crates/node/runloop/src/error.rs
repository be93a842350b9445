//! Runloop error types.

use strata_executor::{ExecutionError, HashBufferError, RecoveryError, ValidationError};
use strata_traits::StoreError;
use thiserror::Error;

use crate::Stage;

/// A block failed while moving through the processor.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Static or post-execution validation rejected the block.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A transaction sender could not be recovered.
    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    /// The execution engine failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The state store failed.
    #[error("state store failed while {stage}: {source}")]
    Store {
        /// Stage the store was called from.
        stage: Stage,
        /// Underlying store error.
        source: StoreError,
    },

    /// The ancestor hash buffer rejected the block hash.
    #[error(transparent)]
    HashBuffer(#[from] HashBufferError),
}

impl BlockError {
    pub(crate) fn store(stage: Stage) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { stage, source }
    }
}

/// The runloop stopped before reaching its target.
#[derive(Debug, Error)]
pub enum RunloopError {
    /// The block store has no block at a height the chain must contain.
    #[error("missing block at height {0}")]
    MissingBlock(u64),

    /// A block failed processing.
    #[error("block {height} failed: {source}")]
    Block {
        /// Height of the failed block.
        height: u64,
        /// Failure reason.
        #[source]
        source: BlockError,
    },

    /// Reading from the block store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The supplied ancestor hash buffer does not continue at the start height.
    #[error("block hash buffer continues at height {next}, but the run starts at {start}")]
    MisalignedBlockHashes {
        /// Height the buffer expects next.
        next: u64,
        /// Height the run starts at.
        start: u64,
    },
}
