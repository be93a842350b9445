//! Block types

pub use alloy_consensus::{BlockBody, Header, TxEnvelope};

/// A block as persisted in the ledger: an Ethereum header plus a body of signed envelopes,
/// ommers and withdrawals.
pub type Block = alloy_consensus::Block<TxEnvelope>;
