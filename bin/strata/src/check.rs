//! Offline ledger check: static validation and sender recovery without execution.

use std::{path::Path, sync::atomic::AtomicUsize};

use alloy_primitives::Address;
use rayon::ThreadPool;
use strata_domain::{AddressSet, Block};
use strata_executor::{
    Chain, Revision, RevisionOne, RevisionPolicy, RevisionThree, RevisionTwo, RevisionZero,
    StrataChain, ValidationError, recover_block, validate_block, validate_body,
};
use strata_runloop::{BlockError, BlockTally, RunSummary, RunloopError, replay};
use strata_traits::{BlockStore, FileBlockStore};
use tracing::{debug, info};

/// Heights to check.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CheckRange {
    pub from: u64,
    pub until: Option<u64>,
    pub batch_size: u64,
}

/// Check the ledger stored under `dir`.
pub(crate) fn check_ledger(
    chain: &StrataChain,
    dir: &Path,
    pool: &ThreadPool,
    range: CheckRange,
    stop: &AtomicUsize,
) -> Result<RunSummary, RunloopError> {
    check_blocks(chain, &FileBlockStore::new(dir), pool, range, stop)
}

/// Walk `range` through the shared replay loop.
///
/// An open-ended range ends at the first height the ledger does not hold. A bounded range
/// requires every block up to `until`.
pub(crate) fn check_blocks<L: BlockStore>(
    chain: &StrataChain,
    ledger: &L,
    pool: &ThreadPool,
    range: CheckRange,
    stop: &AtomicUsize,
) -> Result<RunSummary, RunloopError> {
    let mut next_height = range.from;
    replay(&mut next_height, range.until, range.batch_size, stop, |height| {
        let Some(block) = ledger.get(height)? else {
            if range.until.is_some() {
                return Err(RunloopError::MissingBlock(height));
            }
            info!(height, "Reached end of ledger");
            return Ok(None);
        };
        let addresses = check_block(chain, &block, pool)
            .map_err(|source| RunloopError::Block { height, source })?;
        debug!(height, addresses, "checked block");
        Ok(Some(BlockTally {
            transactions: block.body.transactions.len() as u64,
            gas: block.header.gas_used,
        }))
    })
}

/// Validate `block` and recover its senders, returning how many distinct addresses it touches.
fn check_block(chain: &StrataChain, block: &Block, pool: &ThreadPool) -> Result<usize, BlockError> {
    chain.static_validate_header(&block.header)?;
    let recovered = recover_block(&block.body.transactions, pool);
    let senders = recovered.senders()?;
    match chain.revision(block.header.timestamp) {
        Revision::Zero => validate::<RevisionZero>(block, &senders)?,
        Revision::One => validate::<RevisionOne>(block, &senders)?,
        Revision::Two => validate::<RevisionTwo>(block, &senders)?,
        Revision::Three => validate::<RevisionThree>(block, &senders)?,
    }
    Ok(AddressSet::from_recovered(&senders, &recovered.authorities).len())
}

fn validate<R: RevisionPolicy>(block: &Block, senders: &[Address]) -> Result<(), ValidationError> {
    validate_block::<R>(block)?;
    validate_body::<R>(senders, &block.body.transactions)
}
