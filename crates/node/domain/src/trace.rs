//! Call traces recorded during execution.

use strata_primitives::{Address, Bytes, U256};

/// The kind of call that opened a [`CallFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// A message call.
    Call,
    /// A call executing the callee's code in the caller's context.
    DelegateCall,
    /// A read-only call.
    StaticCall,
    /// Contract creation via `CREATE`.
    Create,
    /// Contract creation via `CREATE2`.
    Create2,
    /// Account destruction.
    SelfDestruct,
}

/// One frame of a transaction's call tree, flattened in pre-order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// How the frame was entered.
    pub kind: CallKind,
    /// Caller address.
    pub from: Address,
    /// Callee address, `None` for a failed creation.
    pub to: Option<Address>,
    /// Value transferred.
    pub value: U256,
    /// Gas made available to the frame.
    pub gas: u64,
    /// Gas consumed by the frame.
    pub gas_used: u64,
    /// Call input.
    pub input: Bytes,
    /// Return or revert data.
    pub output: Bytes,
    /// Nesting depth, zero for the top-level call.
    pub depth: u64,
}
