//! Cross-block validation context.

use alloy_primitives::Address;
use strata_domain::{AddressSet, Ancestors};

/// Read-only view of recent sender activity, built per block and discarded afterwards.
#[derive(Clone, Copy, Debug)]
pub struct ChainContext<'a> {
    /// Senders and authorities of the grandparent block, if known.
    pub grandparent: Option<&'a AddressSet>,
    /// Senders and authorities of the parent block, if known.
    pub parent: Option<&'a AddressSet>,
    /// Senders and authorities of the block being executed.
    pub current: &'a AddressSet,
    /// Recovered sender per transaction.
    pub senders: &'a [Address],
    /// Recovered authorities per transaction.
    pub authorities: &'a [Vec<Option<Address>>],
}

impl<'a> ChainContext<'a> {
    /// Assemble a context from the rolling window and the current block's recovery output.
    pub const fn new(
        ancestors: Ancestors<'a>,
        current: &'a AddressSet,
        senders: &'a [Address],
        authorities: &'a [Vec<Option<Address>>],
    ) -> Self {
        Self {
            grandparent: ancestors.grandparent,
            parent: ancestors.parent,
            current,
            senders,
            authorities,
        }
    }

    /// Returns true if `address` sent or authorized a transaction in the parent or
    /// grandparent block.
    pub fn recently_active(&self, address: &Address) -> bool {
        self.parent.is_some_and(|set| set.contains(address))
            || self.grandparent.is_some_and(|set| set.contains(address))
    }

    /// Index of the first transaction in this block sent by `address`.
    pub fn first_transaction_of(&self, address: &Address) -> Option<usize> {
        self.senders.iter().position(|sender| sender == address)
    }

    /// Returns true if `address` is the authority of any delegation in this block.
    pub fn is_authority(&self, address: &Address) -> bool {
        self.authorities.iter().flatten().flatten().any(|authority| authority == address)
    }
}
