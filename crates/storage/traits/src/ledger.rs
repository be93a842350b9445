//! Block ledger access.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use strata_domain::Block;

use crate::StoreError;

/// Read access to the persisted chain of blocks.
pub trait BlockStore {
    /// Return the block stored at `height`, or `None` if the ledger has no such block.
    fn get(&self, height: u64) -> Result<Option<Block>, StoreError>;
}

impl<T: BlockStore + ?Sized> BlockStore for &T {
    fn get(&self, height: u64) -> Result<Option<Block>, StoreError> {
        (**self).get(height)
    }
}

/// In-memory ledger keyed by block number.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<BTreeMap<u64, Block>>,
}

impl MemoryBlockStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block under its header number, replacing any previous block at that height.
    pub fn insert(&self, block: Block) {
        self.blocks.write().insert(block.header.number, block);
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Returns true if no blocks are stored.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl FromIterator<Block> for MemoryBlockStore {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        let store = Self::new();
        for block in iter {
            store.insert(block);
        }
        store
    }
}

impl BlockStore for MemoryBlockStore {
    fn get(&self, height: u64) -> Result<Option<Block>, StoreError> {
        Ok(self.blocks.read().get(&height).cloned())
    }
}
