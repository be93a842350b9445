//! Chain-specific rules plugged into block processing.

use alloy_consensus::TxEnvelope;
use alloy_primitives::{Address, B64, U256};
use strata_domain::Header;

use crate::{ChainContext, Revision, TxStateView, ValidationError};

/// Default reserve balance: ten native tokens.
pub const DEFAULT_RESERVE_BALANCE: U256 = U256::from_limbs([10_000_000_000_000_000_000, 0, 0, 0]);

/// Maximum header extra data length in bytes.
const MAX_EXTRA_DATA: usize = 32;

/// Arguments passed to [`Chain::revert_transaction`] for one executed transaction.
#[derive(Clone, Copy, Debug)]
pub struct RevertInput<'a> {
    /// Number of the block being executed.
    pub block_number: u64,
    /// Timestamp of the block being executed.
    pub timestamp: u64,
    /// Recovered sender of the transaction.
    pub sender: Address,
    /// The transaction.
    pub tx: &'a TxEnvelope,
    /// Base fee of the block.
    pub base_fee: u64,
    /// Index of the transaction within the block.
    pub index: usize,
}

/// Chain-variant policy consulted by the block processor.
pub trait Chain: Send + Sync {
    /// The chain's identifier.
    fn chain_id(&self) -> u64;

    /// The revision in force for a block with the given timestamp.
    fn revision(&self, timestamp: u64) -> Revision;

    /// Structural validation of a header, independent of its body.
    fn static_validate_header(&self, header: &Header) -> Result<(), ValidationError>;

    /// Decide whether an executed transaction must be reverted.
    ///
    /// `state` reflects the transaction's post-execution state.
    fn revert_transaction(
        &self,
        input: &RevertInput<'_>,
        state: &dyn TxStateView,
        context: &ChainContext<'_>,
    ) -> bool;
}

/// Static chain parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSpec {
    /// Chain identifier.
    pub chain_id: u64,
    /// Revision activations as `(timestamp, revision)`, in ascending timestamp order.
    pub schedule: Vec<(u64, Revision)>,
    /// Minimum balance a recently active sender must retain.
    pub reserve_balance: U256,
}

impl ChainSpec {
    /// A chain running [`Revision::LATEST`] from genesis.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            schedule: vec![(0, Revision::LATEST)],
            reserve_balance: DEFAULT_RESERVE_BALANCE,
        }
    }

    /// Replace the activation schedule.
    #[must_use]
    pub fn with_schedule(mut self, mut schedule: Vec<(u64, Revision)>) -> Self {
        schedule.sort_by_key(|(timestamp, _)| *timestamp);
        self.schedule = schedule;
        self
    }

    /// Replace the reserve balance.
    #[must_use]
    pub const fn with_reserve_balance(mut self, reserve_balance: U256) -> Self {
        self.reserve_balance = reserve_balance;
        self
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::new(1)
    }
}

/// The Strata chain rules.
#[derive(Clone, Debug, Default)]
pub struct StrataChain {
    spec: ChainSpec,
}

impl StrataChain {
    /// Create a chain from its spec.
    pub const fn new(spec: ChainSpec) -> Self {
        Self { spec }
    }

    /// The chain spec.
    pub const fn spec(&self) -> &ChainSpec {
        &self.spec
    }
}

impl Chain for StrataChain {
    fn chain_id(&self) -> u64 {
        self.spec.chain_id
    }

    fn revision(&self, timestamp: u64) -> Revision {
        self.spec
            .schedule
            .iter()
            .rev()
            .find(|(activation, _)| *activation <= timestamp)
            .map(|(_, revision)| *revision)
            .unwrap_or(Revision::Zero)
    }

    fn static_validate_header(&self, header: &Header) -> Result<(), ValidationError> {
        if header.gas_used > header.gas_limit {
            return Err(ValidationError::GasUsedExceedsLimit {
                gas_used: header.gas_used,
                gas_limit: header.gas_limit,
            });
        }
        if header.base_fee_per_gas.is_none() {
            return Err(ValidationError::MissingBaseFee);
        }
        if !header.difficulty.is_zero() {
            return Err(ValidationError::NonZeroDifficulty);
        }
        if header.nonce != B64::ZERO {
            return Err(ValidationError::NonZeroNonce);
        }
        if header.extra_data.len() > MAX_EXTRA_DATA {
            return Err(ValidationError::ExtraDataTooLong(header.extra_data.len()));
        }
        Ok(())
    }

    fn revert_transaction(
        &self,
        input: &RevertInput<'_>,
        state: &dyn TxStateView,
        context: &ChainContext<'_>,
    ) -> bool {
        if !self.revision(input.timestamp).rules().reserve_balance {
            return false;
        }
        if state.balance(&input.sender) >= self.spec.reserve_balance {
            return false;
        }
        // Dipping below the reserve is only allowed for the first transaction of a sender
        // with no activity in the two preceding blocks.
        let emptying = !context.recently_active(&input.sender)
            && context.first_transaction_of(&input.sender) == Some(input.index);
        !emptying
    }
}
