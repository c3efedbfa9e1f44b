//! # Configuration
//!
//! TOML configuration for the launcher. Every key is optional; missing keys
//! fall back to defaults.
//!
//! ```toml
//! [genesis]
//! gas_limit = 15000000
//! initial_balance = 500000
//! tx_allow_list = true
//!
//! [session]
//! genesis_timeout_secs = 10
//! ```

use anyhow::Context;
use l1_launcher_core::GenesisParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Chain parameters fed into genesis derivation.
    pub genesis: GenesisParams,
    pub session: SessionConfig,
}

/// Session behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Deadline for a single genesis derivation (default: 30).
    #[serde(default = "default_genesis_timeout_secs")]
    pub genesis_timeout_secs: u64,
    /// Wallet address used by the `wallet` command when none is given.
    #[serde(default)]
    pub wallet: Option<String>,
}

fn default_genesis_timeout_secs() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            genesis_timeout_secs: default_genesis_timeout_secs(),
            wallet: None,
        }
    }
}

impl SessionConfig {
    pub fn genesis_timeout(&self) -> Duration {
        Duration::from_secs(self.genesis_timeout_secs)
    }
}

impl AppConfig {
    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse config at {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if config.session.genesis_timeout_secs == 0 {
            anyhow::bail!("session.genesis_timeout_secs must be greater than zero");
        }
        Ok(config)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
