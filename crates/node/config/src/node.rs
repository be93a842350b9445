//! Top-level node configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ExecutionConfig};

/// Default chain identifier.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "/var/lib/strata";

/// A protocol revision taking effect at a block timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevisionActivation {
    /// First block timestamp the revision applies to.
    pub timestamp: u64,
    /// Revision number.
    pub revision: u8,
}

/// Node configuration, loaded from TOML (or JSON by file extension).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeConfig {
    /// Chain identifier.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Root directory for node state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Block database directory. Defaults to `<data_dir>/ledger`.
    #[serde(default)]
    pub ledger_dir: Option<PathBuf>,

    /// Execution event ring, as `<name-or-path>[:<descriptors-shift>[:<payload-shift>]]`.
    #[serde(default)]
    pub event_ring: Option<String>,

    /// Revision schedule. Empty means the latest revision from genesis.
    #[serde(default)]
    pub revisions: Vec<RevisionActivation>,

    /// Execution settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            data_dir: default_data_dir(),
            ledger_dir: None,
            event_ring: None,
            revisions: Vec::new(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)?
        } else {
            Self::from_toml(&contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML configuration.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if let Some(pair) =
            self.revisions.windows(2).find(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(ConfigError::UnorderedRevisions { timestamp: pair[1].timestamp });
        }
        Ok(())
    }

    /// The block database directory.
    pub fn ledger_dir(&self) -> PathBuf {
        self.ledger_dir.clone().unwrap_or_else(|| self.data_dir.join("ledger"))
    }
}

const fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}
