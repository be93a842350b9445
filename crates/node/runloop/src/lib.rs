//! Sequential block execution runloop.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod batch;
pub use batch::{BOUNDED_BATCH_SIZE, ThroughputBatch, batch_size_for};

mod driver;
pub use driver::Runloop;

mod error;
pub use error::{BlockError, RunloopError};

mod processor;
pub use processor::{BlockProcessor, ProcessedBlock, SLOW_COMMIT_THRESHOLD, Stage};

mod replay;
pub use replay::{BlockTally, RunSummary, replay};
