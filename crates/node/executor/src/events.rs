//! Execution events published to the event ring.

use std::time::Duration;

use alloy_primitives::{B256, keccak256};

/// Schema identifier for the execution event stream.
///
/// Readers compare [`exec_event_schema_hash`] against the ring header to reject
/// incompatible producers.
pub const EXEC_EVENT_SCHEMA: &str = "strata.exec.v1:block_start(u64,u64,u32);block_finalized(u64,b256,u64,u32,u64,u64)";

/// Keccak-256 of [`EXEC_EVENT_SCHEMA`].
pub fn exec_event_schema_hash() -> B256 {
    keccak256(EXEC_EVENT_SCHEMA.as_bytes())
}

/// An event emitted while processing blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecEvent {
    /// A block passed static validation and is about to be executed.
    BlockStart {
        /// Block number.
        number: u64,
        /// Block timestamp.
        timestamp: u64,
        /// Transactions in the block.
        tx_count: u32,
    },
    /// A block was committed and finalized.
    BlockFinalized {
        /// Block number.
        number: u64,
        /// Committed block hash.
        hash: B256,
        /// Gas used by the block.
        gas_used: u64,
        /// Transactions in the block.
        tx_count: u32,
        /// Speculative retries while executing the block.
        retries: u64,
        /// Wall time spent processing the block.
        elapsed: Duration,
    },
}

impl ExecEvent {
    /// Numeric event type stored in the ring descriptor.
    pub const fn kind(&self) -> u16 {
        match self {
            Self::BlockStart { .. } => 1,
            Self::BlockFinalized { .. } => 2,
        }
    }

    /// Little-endian payload encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(84);
        match self {
            Self::BlockStart { number, timestamp, tx_count } => {
                out.extend_from_slice(&number.to_le_bytes());
                out.extend_from_slice(&timestamp.to_le_bytes());
                out.extend_from_slice(&tx_count.to_le_bytes());
            }
            Self::BlockFinalized { number, hash, gas_used, tx_count, retries, elapsed } => {
                out.extend_from_slice(&number.to_le_bytes());
                out.extend_from_slice(hash.as_slice());
                out.extend_from_slice(&gas_used.to_le_bytes());
                out.extend_from_slice(&tx_count.to_le_bytes());
                out.extend_from_slice(&retries.to_le_bytes());
                let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
                out.extend_from_slice(&micros.to_le_bytes());
            }
        }
        out
    }
}

/// Destination for execution events.
pub trait ExecEventSink: Send + Sync {
    /// Publish one event. Sinks must not block block processing.
    fn record(&self, event: &ExecEvent);
}

/// A sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl ExecEventSink for NoopSink {
    fn record(&self, _event: &ExecEvent) {}
}
