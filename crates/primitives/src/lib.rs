#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub use alloy_primitives::{
    Address, B256, Bloom, Bytes, U256, keccak256,
    map::{DefaultHashBuilder, HashMap, HashSet},
};
