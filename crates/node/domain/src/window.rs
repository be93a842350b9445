//! Rolling window over the address sets of the most recent blocks.

use crate::AddressSet;

/// Number of generations retained by an [`AddressWindow`].
pub const WINDOW_DEPTH: usize = 3;

/// A fixed-depth FIFO over the [`AddressSet`]s of the last three processed blocks.
///
/// Generations are rotated by move. A `None` generation means no history is available
/// for that depth, as happens at chain start.
#[derive(Debug, Default)]
pub struct AddressWindow {
    current: Option<AddressSet>,
    parent: Option<AddressSet>,
    grandparent: Option<AddressSet>,
}

/// The generations a block about to be processed sees as its ancestors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ancestors<'a> {
    /// Senders and authorities of the block's parent.
    pub parent: Option<&'a AddressSet>,
    /// Senders and authorities of the block's grandparent.
    pub grandparent: Option<&'a AddressSet>,
}

impl AddressWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict the grandparent, shift the remaining generations back and install `set`
    /// as the current generation.
    pub fn slide(&mut self, set: AddressSet) {
        self.grandparent = self.parent.take();
        self.parent = self.current.replace(set);
    }

    /// The most recently installed generation.
    pub const fn current(&self) -> Option<&AddressSet> {
        self.current.as_ref()
    }

    /// The generation installed before [`Self::current`].
    pub const fn parent(&self) -> Option<&AddressSet> {
        self.parent.as_ref()
    }

    /// The oldest retained generation.
    pub const fn grandparent(&self) -> Option<&AddressSet> {
        self.grandparent.as_ref()
    }

    /// The ancestry of the next block: its parent is our current generation.
    pub const fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { parent: self.current.as_ref(), grandparent: self.parent.as_ref() }
    }

    /// Number of generations that hold a value.
    pub fn generations(&self) -> usize {
        [&self.current, &self.parent, &self.grandparent].iter().filter(|g| g.is_some()).count()
    }
}
