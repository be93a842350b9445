//! Collaborator traits for the block ledger and the persistent state store.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::StoreError;

mod file;
pub use file::FileBlockStore;

mod ledger;
pub use ledger::{BlockStore, MemoryBlockStore};

mod state;
pub use state::{CommitInput, StateStore};
