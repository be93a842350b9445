//! Directory-backed block ledger.

use std::{
    io,
    path::{Path, PathBuf},
};

use alloy_rlp::{Decodable, Encodable};
use strata_domain::Block;

use crate::{BlockStore, StoreError};

/// Ledger storing each block RLP-encoded in `<dir>/<height>.rlp`.
#[derive(Debug, Clone)]
pub struct FileBlockStore {
    dir: PathBuf,
}

impl FileBlockStore {
    /// Open a ledger rooted at `dir`. The directory need not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The ledger directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, height: u64) -> PathBuf {
        self.dir.join(format!("{height}.rlp"))
    }

    /// Persist `block` under its header number.
    pub fn insert(&self, block: &Block) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut encoded = Vec::with_capacity(block.length());
        block.encode(&mut encoded);
        std::fs::write(self.path_for(block.header.number), encoded)?;
        Ok(())
    }
}

impl BlockStore for FileBlockStore {
    fn get(&self, height: u64) -> Result<Option<Block>, StoreError> {
        let bytes = match std::fs::read(self.path_for(height)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let block = Block::decode(&mut bytes.as_slice())
            .map_err(|err| StoreError::Decode { height, reason: err.to_string() })?;
        if block.header.number != height {
            return Err(StoreError::Decode {
                height,
                reason: format!("file holds block {}", block.header.number),
            });
        }
        Ok(Some(block))
    }
}
