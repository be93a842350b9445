//! Event ring error types.

use std::{io, path::PathBuf};

use thiserror::Error;

/// A ring configuration string could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingConfigError {
    /// The string has fewer than one or more than three `:`-separated fields.
    #[error(
        "input `{input}` does not have expected format \
         <ring-name-or-path>[:<descriptors-shift>[:<payload-buffer-shift>]]"
    )]
    FieldCount {
        /// The rejected input.
        input: String,
        /// Number of fields found.
        fields: usize,
    },

    /// The ring name or path is empty.
    #[error("event ring name is empty")]
    EmptyName,

    /// A shift field is not a valid integer.
    #[error("parse error in {field} `{token}`: {reason}")]
    InvalidShift {
        /// Which shift field was malformed.
        field: &'static str,
        /// The offending token.
        token: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Acquiring ownership of an event ring file failed.
#[derive(Debug, Error)]
pub enum RingError {
    /// Another live process holds the ring's lock.
    #[error(
        "event ring file `{path}` is owned by {}",
        .owner.map_or_else(|| "an unknown other process".to_string(), |pid| format!("pid {pid}"))
    )]
    Contended {
        /// The contended ring path.
        path: PathBuf,
        /// Owning process, when it could be identified.
        owner: Option<u32>,
    },

    /// The existing ring file could not be opened for inspection.
    #[error("could not open event ring file `{path}`: {source}")]
    Open {
        /// Ring path.
        path: PathBuf,
        /// IO error.
        source: io::Error,
    },

    /// Taking an advisory lock failed for a reason other than contention.
    #[error("flock on event ring file `{path}` failed: {source}")]
    Lock {
        /// Locked path.
        path: PathBuf,
        /// IO error.
        source: io::Error,
    },

    /// The temporary initialization file could not be created.
    #[error("could not create event ring temporary initialization file `{path}`: {source}")]
    Create {
        /// Temporary path.
        path: PathBuf,
        /// IO error.
        source: io::Error,
    },

    /// Writing the ring layout failed.
    #[error("could not initialize event ring file `{path}`: {source}")]
    Initialize {
        /// Temporary path.
        path: PathBuf,
        /// IO error.
        source: io::Error,
    },

    /// Publishing the initialized file under its final name failed.
    #[error("rename of {from} -> {to} failed: {source}")]
    Rename {
        /// Temporary path.
        from: PathBuf,
        /// Ring path.
        to: PathBuf,
        /// IO error.
        source: io::Error,
    },

    /// The requested layout is outside supported bounds.
    #[error("invalid event ring layout: {0}")]
    InvalidLayout(String),

    /// The default ring directory could not be created.
    #[error("open of event ring default directory `{path}` failed: {source}")]
    DefaultDir {
        /// Default directory.
        path: PathBuf,
        /// IO error.
        source: io::Error,
    },
}

/// The process-wide recorder could not be installed.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// A global recorder is already installed.
    #[error("execution event recorder initialized twice")]
    AlreadyInitialized,
}
