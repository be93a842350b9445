//! Sets of recovered addresses.

use strata_primitives::{Address, HashSet};

/// The unique senders and authorities recovered from a single block.
///
/// An empty set is a block without senders; the absence of history is modelled by the
/// surrounding `Option`, never by an empty set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSet {
    inner: HashSet<Address>,
}

impl AddressSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` addresses.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: HashSet::with_capacity_and_hasher(capacity, Default::default()) }
    }

    /// Merge a block's recovered senders and authorities.
    ///
    /// Authorities that failed recovery are skipped.
    pub fn from_recovered<'a>(
        senders: impl IntoIterator<Item = &'a Address>,
        authorities: &[Vec<Option<Address>>],
    ) -> Self {
        let senders = senders.into_iter();
        let mut set = Self::with_capacity(senders.size_hint().0);
        set.extend(senders.copied());
        set.extend(authorities.iter().flatten().flatten().copied());
        set
    }

    /// Insert an address, returning whether it was newly added.
    pub fn insert(&mut self, address: Address) -> bool {
        self.inner.insert(address)
    }

    /// Returns true if the address is a member.
    pub fn contains(&self, address: &Address) -> bool {
        self.inner.contains(address)
    }

    /// Number of unique addresses.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the members in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.inner.iter()
    }
}

impl Extend<Address> for AddressSet {
    fn extend<I: IntoIterator<Item = Address>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

impl FromIterator<Address> for AddressSet {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
