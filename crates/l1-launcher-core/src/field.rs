//! # Field Module
//!
//! Typed configuration keys and values collected by the wizard.

use crate::validate::Validation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A configuration key. The set is fixed by the step schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    EvmChainId,
    L1Name,
    WalletAddress,
    TokenSymbol,
    Allocations,
}

impl FieldKey {
    pub const ALL: [FieldKey; 5] = [
        FieldKey::EvmChainId,
        FieldKey::L1Name,
        FieldKey::WalletAddress,
        FieldKey::TokenSymbol,
        FieldKey::Allocations,
    ];

    /// camelCase name used in snapshots and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::EvmChainId => "evmChainId",
            Self::L1Name => "l1Name",
            Self::WalletAddress => "walletAddress",
            Self::TokenSymbol => "tokenSymbol",
            Self::Allocations => "allocations",
        }
    }

    /// Parse a raw string into the value type this key expects.
    ///
    /// Chain ids must be decimal integers. Allocations use
    /// `0xADDR=BALANCE[,0xADDR=BALANCE...]` with decimal balances in wei.
    pub fn parse_value(self, raw: &str) -> Result<FieldValue, ParseFieldError> {
        let raw = raw.trim();
        match self {
            Self::EvmChainId => raw
                .parse::<u64>()
                .map(FieldValue::ChainId)
                .map_err(|_| ParseFieldError::new(self, format!("'{raw}' is not a chain id"))),
            Self::L1Name | Self::TokenSymbol => Ok(FieldValue::Text(raw.to_string())),
            Self::WalletAddress => Ok(FieldValue::Address(raw.to_string())),
            Self::Allocations => {
                let mut allocations = Vec::new();
                for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let (address, balance) = item.split_once('=').ok_or_else(|| {
                        ParseFieldError::new(self, format!("'{item}' is not ADDRESS=BALANCE"))
                    })?;
                    let balance = balance.trim().parse::<u128>().map_err(|_| {
                        ParseFieldError::new(self, format!("'{balance}' is not a balance"))
                    })?;
                    allocations.push(Allocation::new(address.trim(), balance));
                }
                Ok(FieldValue::Allocations(allocations))
            }
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKey {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(needle))
            .or(match needle {
                "chain-id" => Some(Self::EvmChainId),
                "name" => Some(Self::L1Name),
                "wallet" => Some(Self::WalletAddress),
                "symbol" => Some(Self::TokenSymbol),
                "alloc" => Some(Self::Allocations),
                _ => None,
            })
            .ok_or_else(|| ParseFieldError::UnknownKey(needle.to_string()))
    }
}

/// Failure to turn raw text into a [`FieldKey`] or [`FieldValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFieldError {
    #[error("unknown field '{0}'")]
    UnknownKey(String),

    #[error("{key}: {message}")]
    BadValue { key: FieldKey, message: String },
}

impl ParseFieldError {
    fn new(key: FieldKey, message: String) -> Self {
        Self::BadValue { key, message }
    }
}

/// An initial balance in the genesis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub address: String,
    /// Balance in wei.
    pub balance: u128,
}

impl Allocation {
    #[must_use]
    pub fn new(address: impl Into<String>, balance: u128) -> Self {
        Self {
            address: address.into(),
            balance,
        }
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    ChainId(u64),
    Text(String),
    Address(String),
    Allocations(Vec<Allocation>),
}

impl FieldValue {
    #[must_use]
    pub fn as_chain_id(&self) -> Option<u64> {
        match self {
            Self::ChainId(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Address(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_allocations(&self) -> Option<&[Allocation]> {
        match self {
            Self::Allocations(list) => Some(list),
            _ => None,
        }
    }

    /// Short human-readable rendering for status output.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::ChainId(id) => id.to_string(),
            Self::Text(s) | Self::Address(s) => s.clone(),
            Self::Allocations(list) => format!("{} allocation(s)", list.len()),
        }
    }
}

/// A stored field: the raw value plus the outcome of its validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub value: FieldValue,
    pub validation: Validation,
}

impl FieldEntry {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }
}

// =============================================================================
// TESTS
// =============================================================================
