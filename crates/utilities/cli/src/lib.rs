//! Minimal CLI utilities for the Strata binary.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod backtrace;
pub use backtrace::Backtracing;

#[cfg(unix)]
mod stop;
#[cfg(unix)]
pub use stop::StopSignal;
