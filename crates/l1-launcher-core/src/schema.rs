//! # Schema Module
//!
//! Declarative binding of fields to validators and of steps to the fields
//! they require. The orchestrator only consults the schema; it never
//! hard-codes a check for a particular step.

use crate::field::{FieldKey, FieldValue};
use crate::step::Step;
use crate::validate::{self, Validation, Validator};
use std::collections::BTreeMap;
use std::fmt;

/// What a step needs before `advance()` may leave it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRequirement {
    /// Fields that must be present and valid.
    pub fields: Vec<FieldKey>,
    /// Whether a fresh genesis artifact must exist.
    pub needs_genesis: bool,
}

impl StepRequirement {
    #[must_use]
    pub fn fields(fields: &[FieldKey]) -> Self {
        Self {
            fields: fields.to_vec(),
            needs_genesis: false,
        }
    }

    #[must_use]
    pub fn genesis() -> Self {
        Self {
            fields: Vec::new(),
            needs_genesis: true,
        }
    }
}

/// Field validators and step requirements.
pub struct Schema {
    validators: BTreeMap<FieldKey, Box<dyn Validator>>,
    steps: BTreeMap<Step, StepRequirement>,
}

impl Schema {
    /// An empty schema: every value is valid and every step is free.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
            steps: BTreeMap::new(),
        }
    }

    /// The launcher's standard schema.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_validator(FieldKey::EvmChainId, validate::chain_id_field)
            .with_validator(FieldKey::L1Name, validate::l1_name_field)
            .with_validator(FieldKey::WalletAddress, validate::wallet_address_field)
            .with_validator(FieldKey::TokenSymbol, validate::token_symbol_field)
            .with_validator(FieldKey::Allocations, validate::allocations_field)
            .with_step(Step::ChainId, StepRequirement::fields(&[FieldKey::EvmChainId]))
            .with_step(Step::ChainName, StepRequirement::fields(&[FieldKey::L1Name]))
            .with_step(Step::Wallet, StepRequirement::fields(&[FieldKey::WalletAddress]))
            .with_step(Step::Genesis, StepRequirement::genesis())
    }

    /// Bind (or replace) the validator for a field.
    #[must_use]
    pub fn with_validator(mut self, key: FieldKey, validator: impl Validator + 'static) -> Self {
        self.validators.insert(key, Box::new(validator));
        self
    }

    /// Set (or replace) the requirement for a step.
    #[must_use]
    pub fn with_step(mut self, step: Step, requirement: StepRequirement) -> Self {
        self.steps.insert(step, requirement);
        self
    }

    /// Run the validator bound to `key`. Unbound keys are always valid.
    pub fn validate(&self, key: FieldKey, value: &FieldValue) -> Validation {
        self.validators
            .get(&key)
            .map(|v| v.check(value))
            .unwrap_or(Validation::Valid)
    }

    /// The requirement for a step. Steps without one require nothing.
    pub fn requirement(&self, step: Step) -> StepRequirement {
        self.steps.get(&step).cloned().unwrap_or_default()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("validated", &self.validators.keys().collect::<Vec<_>>())
            .field("steps", &self.steps)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_binds_every_field() {
        let schema = Schema::standard();
        for key in FieldKey::ALL {
            assert!(schema.validators.contains_key(&key), "{key} has no validator");
        }
    }

    #[test]
    fn standard_step_requirements() {
        let schema = Schema::standard();
        assert_eq!(schema.requirement(Step::ChainId).fields, vec![FieldKey::EvmChainId]);
        assert_eq!(schema.requirement(Step::ChainName).fields, vec![FieldKey::L1Name]);
        assert!(schema.requirement(Step::Genesis).needs_genesis);
        assert_eq!(schema.requirement(Step::Deploy), StepRequirement::default());
    }

    #[test]
    fn unbound_key_is_valid() {
        let schema = Schema::empty();
        assert!(schema.validate(FieldKey::EvmChainId, &FieldValue::ChainId(0)).is_valid());
    }

    #[test]
    fn custom_validator_replaces_standard() {
        let schema = Schema::standard().with_validator(FieldKey::EvmChainId, |v: &FieldValue| {
            Validation::check(v.as_chain_id().is_some_and(|id| id > 1000), || {
                "reserved".into()
            })
        });
        assert!(!schema.validate(FieldKey::EvmChainId, &FieldValue::ChainId(5)).is_valid());
        assert!(schema.validate(FieldKey::EvmChainId, &FieldValue::ChainId(43114)).is_valid());
    }
}
