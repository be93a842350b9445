//! Error types for ledger and state store operations.

use thiserror::Error;

/// Error type for ledger and state store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stored block could not be decoded.
    #[error("failed to decode block {height}: {reason}")]
    Decode {
        /// Height of the undecodable block.
        height: u64,
        /// Decoder message.
        reason: String,
    },

    /// No header is available for the selected block.
    #[error("no header stored for block {0}")]
    MissingHeader(u64),

    /// Storage error from the underlying engine.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O failure reading or writing the store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
