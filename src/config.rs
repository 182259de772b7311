//! Chain configuration
//!
//! Parameters every node must agree on (genesis key and timestamp, block
//! version) plus local settings. Loaded from JSON or the environment.

use crate::core::BLOCK_VERSION;
use crate::crypto::PrivateKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Published development phrase. Real deployments override it.
pub const DEV_CHAIN_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Default genesis timestamp in nanoseconds
pub const DEFAULT_GENESIS_TIMESTAMP: i64 = 1_724_695_016_265_493_000;

pub const ENV_CHAIN_MNEMONIC: &str = "LEDGER_CHAIN_MNEMONIC";
pub const ENV_DATA_DIR: &str = "LEDGER_DATA_DIR";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What happens to the mempool after a block is accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MempoolPolicy {
    /// Drop only the transactions the block included
    #[default]
    RemoveIncluded,
    /// Drop everything
    FlushAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Mnemonic of the key that signs the genesis block
    pub chain_mnemonic: String,
    /// Genesis block timestamp (ns); fixed so every node derives the same genesis hash
    pub genesis_timestamp: i64,
    pub block_version: u32,
    pub mempool_policy: MempoolPolicy,
    /// Directory for the file-backed block store
    pub data_dir: PathBuf,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_mnemonic: DEV_CHAIN_MNEMONIC.to_string(),
            genesis_timestamp: DEFAULT_GENESIS_TIMESTAMP,
            block_version: BLOCK_VERSION,
            mempool_policy: MempoolPolicy::default(),
            data_dir: PathBuf::from(".ledger_data"),
        }
    }
}

impl ChainConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Defaults overlaid with `LEDGER_CHAIN_MNEMONIC` and `LEDGER_DATA_DIR`
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment variable name
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(mnemonic) = lookup(ENV_CHAIN_MNEMONIC) {
            self.chain_mnemonic = mnemonic;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// The key that signs the genesis block
    pub fn genesis_key(&self) -> PrivateKey {
        PrivateKey::from_mnemonic(&self.chain_mnemonic)
    }
}
