//! # Step Module
//!
//! The fixed, totally ordered list of wizard steps.
//!
//! The derived `Ord` follows declaration order, so `a < b` means "a comes
//! before b in the wizard". The high-water mark comparisons in the
//! orchestrator rely on this.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One discrete stage of the configuration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Pick the EVM chain id.
    #[serde(rename = "configure-chain-id")]
    ChainId,
    /// Pick the human-readable L1 name.
    #[serde(rename = "configure-name")]
    ChainName,
    /// Connect the owner wallet.
    #[serde(rename = "connect-wallet")]
    Wallet,
    /// Generate the genesis document.
    Genesis,
    /// Review and hand off for deployment.
    Deploy,
}

impl Step {
    /// All steps in wizard order.
    pub const ALL: [Step; 5] = [
        Step::ChainId,
        Step::ChainName,
        Step::Wallet,
        Step::Genesis,
        Step::Deploy,
    ];

    /// The first step of every session.
    pub const FIRST: Step = Step::ChainId;

    /// The terminal step.
    pub const LAST: Step = Step::Deploy;

    /// Zero-based position in [`Step::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::ChainId => 0,
            Self::ChainName => 1,
            Self::Wallet => 2,
            Self::Genesis => 3,
            Self::Deploy => 4,
        }
    }

    /// The step after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index().saturating_add(1)).copied()
    }

    /// The step before this one, if any.
    #[must_use]
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    /// Stable kebab-case identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::ChainId => "configure-chain-id",
            Self::ChainName => "configure-name",
            Self::Wallet => "connect-wallet",
            Self::Genesis => "genesis",
            Self::Deploy => "deploy",
        }
    }

    /// Short title for display.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::ChainId => "Chain ID",
            Self::ChainName => "L1 Name",
            Self::Wallet => "Connect Wallet",
            Self::Genesis => "Genesis Settings",
            Self::Deploy => "Deploy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when a string does not name a step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step '{0}'")]
pub struct UnknownStep(pub String);

impl FromStr for Step {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.id() == needle)
            .or_else(|| {
                // 1-based position, as shown by the `steps` listing
                needle
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| Self::ALL.get(i).copied())
            })
            .ok_or_else(|| UnknownStep(needle.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
