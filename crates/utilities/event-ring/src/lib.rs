//! Exclusively owned, crash-safe event ring files.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod allocator;
pub use allocator::{OwnedRing, create_owned_ring, temp_path_for};

mod config;
pub use config::{
    DEFAULT_DESCRIPTORS_SHIFT, DEFAULT_PAYLOAD_BUF_SHIFT, RING_DIR_ENV, RingConfig,
    default_ring_dir,
};

mod error;
pub use error::{RecorderError, RingConfigError, RingError};

mod layout;
pub use layout::{
    CONTENT_TYPE_EXEC, DESCRIPTOR_SIZE, HEADER_SIZE, RING_MAGIC, RING_VERSION, RingLayout,
};

mod lock;
pub use lock::{find_lock_owner, parse_proc_locks, supports_hugetlb};

mod recorder;
pub use recorder::{EventRecorder, global_recorder, init_exec_recorder, init_global_recorder};

mod signals;
pub use signals::SignalShield;
