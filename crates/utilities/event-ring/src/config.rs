//! Event ring configuration strings.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{RingConfigError, RingError};

/// Default log2 of the descriptor count.
pub const DEFAULT_DESCRIPTORS_SHIFT: u8 = 20;

/// Default log2 of the payload buffer size in bytes.
pub const DEFAULT_PAYLOAD_BUF_SHIFT: u8 = 28;

/// Environment variable overriding the default ring directory.
pub const RING_DIR_ENV: &str = "STRATA_EVENT_RING_DIR";

const FALLBACK_RING_DIR: &str = "/dev/shm/strata";

/// A parsed `<ring-name-or-path>[:<descriptors-shift>[:<payload-buffer-shift>]]` string.
///
/// Empty shift fields fall back to their defaults, so `exec::30` only overrides the
/// payload buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingConfig {
    /// Ring file name, or a path if it contains a `/`.
    pub ring: String,
    /// log2 of the descriptor count.
    pub descriptors_shift: u8,
    /// log2 of the payload buffer size in bytes.
    pub payload_buf_shift: u8,
}

impl RingConfig {
    /// Returns true if the ring is a bare file name rather than a path.
    pub fn is_bare_name(&self) -> bool {
        !self.ring.contains('/')
    }

    /// The ring file path, with bare names placed in `dir`.
    pub fn resolve_in(&self, dir: &Path) -> PathBuf {
        if self.is_bare_name() { dir.join(&self.ring) } else { PathBuf::from(&self.ring) }
    }

    /// The ring file path, with bare names placed in the [default ring directory],
    /// which is created if missing.
    ///
    /// [default ring directory]: default_ring_dir
    pub fn resolve(&self) -> Result<PathBuf, RingError> {
        if !self.is_bare_name() {
            return Ok(PathBuf::from(&self.ring));
        }
        let dir = default_ring_dir();
        std::fs::create_dir_all(&dir)
            .map_err(|source| RingError::DefaultDir { path: dir.clone(), source })?;
        Ok(self.resolve_in(&dir))
    }
}

impl FromStr for RingConfig {
    type Err = RingConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = input.split(':').collect();
        if tokens.len() > 3 {
            return Err(RingConfigError::FieldCount {
                input: input.to_string(),
                fields: tokens.len(),
            });
        }
        if tokens[0].is_empty() {
            return Err(RingConfigError::EmptyName);
        }
        Ok(Self {
            ring: tokens[0].to_string(),
            descriptors_shift: parse_shift(
                tokens.get(1).copied(),
                "descriptors-shift",
                DEFAULT_DESCRIPTORS_SHIFT,
            )?,
            payload_buf_shift: parse_shift(
                tokens.get(2).copied(),
                "payload-buffer-shift",
                DEFAULT_PAYLOAD_BUF_SHIFT,
            )?,
        })
    }
}

fn parse_shift(
    token: Option<&str>,
    field: &'static str,
    default: u8,
) -> Result<u8, RingConfigError> {
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return Ok(default);
    };
    let invalid = |reason: String| RingConfigError::InvalidShift {
        field,
        token: token.to_string(),
        reason,
    };
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!("{token} contains non-integer characters")));
    }
    token.parse().map_err(|err| invalid(format!("could not parse {token} as integer: {err}")))
}

/// Directory bare ring names resolve against: `$STRATA_EVENT_RING_DIR` if set, otherwise
/// `/dev/shm/strata`.
pub fn default_ring_dir() -> PathBuf {
    std::env::var_os(RING_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map_or_else(|| PathBuf::from(FALLBACK_RING_DIR), PathBuf::from)
}
