//! Core domain types used across Strata crates.
#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod addresses;
pub use addresses::AddressSet;

mod block;
pub use block::{Block, BlockBody, Header, TxEnvelope};

mod idents;
pub use idents::BlockId;

mod trace;
pub use trace::{CallFrame, CallKind};

mod window;
pub use window::{Ancestors, AddressWindow, WINDOW_DEPTH};
