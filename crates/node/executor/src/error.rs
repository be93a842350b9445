//! Execution error types.

use alloy_primitives::Address;
use strata_traits::StoreError;
use thiserror::Error;

/// A block violated a static or post-execution validation rule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Header reports more gas used than its limit allows.
    #[error("gas used {gas_used} exceeds gas limit {gas_limit}")]
    GasUsedExceedsLimit {
        /// Declared gas used.
        gas_used: u64,
        /// Declared gas limit.
        gas_limit: u64,
    },

    /// Header has no base fee.
    #[error("missing base fee")]
    MissingBaseFee,

    /// Header carries proof-of-work difficulty.
    #[error("non-zero difficulty")]
    NonZeroDifficulty,

    /// Header carries a proof-of-work nonce.
    #[error("non-zero header nonce")]
    NonZeroNonce,

    /// Header extra data is longer than allowed.
    #[error("extra data too long: {0} bytes")]
    ExtraDataTooLong(usize),

    /// Block body carries ommers.
    #[error("unexpected ommers: {0}")]
    UnexpectedOmmers(usize),

    /// Header ommers hash is not the empty list hash.
    #[error("invalid ommers hash")]
    InvalidOmmersHash,

    /// Revision requires withdrawals but the block carries none.
    #[error("missing withdrawals")]
    MissingWithdrawals,

    /// Revision forbids withdrawals but the block carries some.
    #[error("unexpected withdrawals")]
    UnexpectedWithdrawals,

    /// A set-code transaction appears before its revision activates.
    #[error("transaction {index}: authorization lists are not active")]
    AuthorizationsNotActive {
        /// Index of the offending transaction.
        index: usize,
    },

    /// A set-code transaction declares no authorizations.
    #[error("transaction {index}: empty authorization list")]
    EmptyAuthorizationList {
        /// Index of the offending transaction.
        index: usize,
    },

    /// A sender's nonces are not contiguous within the block.
    #[error("transaction {index}: nonce gap for {sender}, expected {expected}, got {got}")]
    NonceGap {
        /// Index of the offending transaction.
        index: usize,
        /// Sender whose nonce sequence broke.
        sender: Address,
        /// Nonce following the sender's previous transaction.
        expected: u64,
        /// Nonce carried by the transaction.
        got: u64,
    },

    /// Committed header disagrees with the declared header.
    #[error("output header mismatch in {field}: expected {expected}, got {got}")]
    OutputHeaderMismatch {
        /// Header field that differs.
        field: &'static str,
        /// Value declared by the block.
        expected: String,
        /// Value computed by the commit.
        got: String,
    },
}

/// Signature recovery failed for a block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoveryError {
    /// A transaction's sender could not be recovered.
    #[error("missing sender for transaction {index}")]
    MissingSender {
        /// Index of the transaction.
        index: usize,
    },
}

/// Errors that can occur during block execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A transaction failed for a reason other than a speculative conflict.
    #[error("transaction {index} failed: {reason}")]
    Transaction {
        /// Index of the failed transaction.
        index: usize,
        /// Engine-provided reason.
        reason: String,
    },

    /// State store error.
    #[error("state error: {0}")]
    State(#[from] StoreError),

    /// Engine-level failure not attributable to one transaction.
    #[error("engine error: {0}")]
    Engine(String),
}
