//! Configuration types for Strata nodes.
#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ConfigError;

mod execution;
pub use execution::{DEFAULT_BATCH_SIZE, DEFAULT_THREADS, ExecutionConfig};

mod node;
pub use node::{DEFAULT_CHAIN_ID, DEFAULT_DATA_DIR, NodeConfig, RevisionActivation};
