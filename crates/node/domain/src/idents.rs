//! Identifiers

use strata_primitives::B256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Block identifier (32 bytes).
///
/// Finalized blocks are keyed by height, so the identifier carries the big-endian
/// height in its low eight bytes.
pub struct BlockId(pub B256);

impl BlockId {
    /// Derive the identifier of the finalized block at `height`.
    pub fn from_height(height: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&height.to_be_bytes());
        Self(B256::from(bytes))
    }

    /// The identifier of the parent of the block at `height`.
    ///
    /// Genesis has no parent and maps to the zero identifier.
    pub fn parent_of(height: u64) -> Self {
        height.checked_sub(1).map(Self::from_height).unwrap_or_default()
    }
}
