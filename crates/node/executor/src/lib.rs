//! Block execution building blocks for the Strata runloop.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod chain;
pub use chain::{Chain, ChainSpec, DEFAULT_RESERVE_BALANCE, RevertInput, StrataChain};

mod context;
pub use context::ChainContext;

mod error;
pub use error::{ExecutionError, RecoveryError, ValidationError};

mod events;
pub use events::{EXEC_EVENT_SCHEMA, ExecEvent, ExecEventSink, NoopSink, exec_event_schema_hash};

mod hash_buffer;
pub use hash_buffer::{BLOCK_HASH_BUFFER_SIZE, BlockHashBuffer, HashBufferError};

mod metrics;
pub use metrics::BlockMetrics;

mod recovery;
pub use recovery::{
    Recovered, recover_authorities, recover_block, recover_sender, recover_senders,
    recover_tx_authorities,
};

mod revision;
pub use revision::{
    Revision, RevisionOne, RevisionPolicy, RevisionRules, RevisionThree, RevisionTwo,
    RevisionZero, UnknownRevision,
};

mod speculate;
pub use speculate::{Attempt, speculate};

mod traits;
pub use traits::{BlockExecutor, BlockOutput, ExecutionInput, RevertHook, TxStateView};

mod validation;
pub use validation::{validate_block, validate_body, validate_output_header};
