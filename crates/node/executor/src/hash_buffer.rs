//! Rolling buffer of recent block hashes.

use alloy_primitives::B256;
use thiserror::Error;

/// Number of ancestor hashes reachable through `BLOCKHASH`.
pub const BLOCK_HASH_BUFFER_SIZE: usize = 256;

/// A hash was appended out of height order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashBufferError {
    /// The buffer expected the next consecutive height.
    #[error("out of order block hash: expected height {expected}, got {got}")]
    OutOfOrder {
        /// Next height the buffer accepts.
        expected: u64,
        /// Height that was supplied.
        got: u64,
    },
}

/// Fixed-capacity ring of the most recent [`BLOCK_HASH_BUFFER_SIZE`] block hashes.
#[derive(Clone, Debug)]
pub struct BlockHashBuffer {
    hashes: Box<[B256; BLOCK_HASH_BUFFER_SIZE]>,
    first: u64,
    next: u64,
}

impl Default for BlockHashBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockHashBuffer {
    /// An empty buffer accepting height zero first.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// An empty buffer whose first accepted height is `height`.
    pub fn starting_at(height: u64) -> Self {
        Self { hashes: Box::new([B256::ZERO; BLOCK_HASH_BUFFER_SIZE]), first: height, next: height }
    }

    /// Height the next [`set`](Self::set) must supply.
    pub const fn next_height(&self) -> u64 {
        self.next
    }

    /// Returns true if no hash has been recorded yet.
    pub const fn is_empty(&self) -> bool {
        self.next == self.first
    }

    /// Record the hash of block `height`.
    pub fn set(&mut self, height: u64, hash: B256) -> Result<(), HashBufferError> {
        if height != self.next {
            return Err(HashBufferError::OutOfOrder { expected: self.next, got: height });
        }
        self.hashes[slot(height)] = hash;
        self.next += 1;
        Ok(())
    }

    /// Hash of block `height`, if it is among the last [`BLOCK_HASH_BUFFER_SIZE`] recorded.
    pub fn get(&self, height: u64) -> Option<B256> {
        let oldest = self.next.saturating_sub(BLOCK_HASH_BUFFER_SIZE as u64).max(self.first);
        (height >= oldest && height < self.next).then(|| self.hashes[slot(height)])
    }
}

const fn slot(height: u64) -> usize {
    (height % BLOCK_HASH_BUFFER_SIZE as u64) as usize
}
