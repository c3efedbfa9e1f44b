//! # Error Module
//!
//! Failures surfaced by the wizard.
//!
//! Field validation failures are not errors: they show up as
//! [`crate::Validation::Invalid`] and simply block navigation.

use crate::field::FieldKey;
use crate::step::Step;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Genesis derivation could not complete. Recoverable: the user may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenesisGenerationError {
    #[error("EVM chain id is required to generate a genesis")]
    MissingChainId,

    #[error("{field} is invalid: {reason}")]
    InvalidField { field: FieldKey, reason: String },

    #[error("address {address} is allocated more than once")]
    DuplicateAllocation { address: String },

    #[error("total allocated balance overflows")]
    BalanceOverflow,

    #[error("failed to serialize genesis: {0}")]
    Serialization(String),

    #[error("genesis generation timed out after {secs}s")]
    TimedOut { secs: u64 },

    #[error("genesis generation aborted: {0}")]
    Aborted(String),
}

/// An action was invoked in a state where it is not allowed.
///
/// The surface is expected to disable these actions up front; the core
/// refuses them again and leaves state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error("a genesis generation is already in flight")]
    RegenerationInFlight,

    #[error("genesis can only be generated while it is the furthest step reached, or from the genesis step once it is stale (furthest reached: {max_advanced})")]
    GenesisStepNotCurrent { max_advanced: Step },

    #[error("regeneration ticket belongs to a different wizard session")]
    ForeignTicket,
}

/// Any failure from a wizard operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error(transparent)]
    Genesis(#[from] GenesisGenerationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),
}

// =============================================================================
// TESTS
// =============================================================================
