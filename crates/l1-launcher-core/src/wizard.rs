//! # Wizard Orchestrator
//!
//! Owns the session state and funnels every mutation through a small set of
//! operations:
//!
//! - `set_field` / `clear_field` / `connect_wallet` update fields and never
//!   move the current step
//! - `advance` moves forward one step, gated on the current step's schema
//!   requirement
//! - `go_back` / `jump_to` move backwards, bounded by the high-water mark
//! - `regenerate_genesis` (or the two-phase `begin_regeneration` /
//!   `complete_regeneration`) derives the genesis artifact
//!
//! ## Invariants
//!
//! - `current_step <= max_advanced_step`, and `max_advanced_step` never
//!   decreases
//! - navigation that is not allowed returns [`Navigation::Denied`] and leaves
//!   state untouched
//! - a failed derivation keeps the previous genesis artifact
//! - a genesis artifact derived from different fields or parameters than the
//!   current ones is stale; it is kept for display but does not satisfy the
//!   genesis step
//! - steps after the genesis step cannot be jumped to while the genesis is
//!   missing or stale; a stale genesis can be rebuilt from the genesis step

use crate::error::{GenesisGenerationError, PreconditionViolation, WizardError};
use crate::field::{FieldEntry, FieldKey, FieldValue};
use crate::genesis::{Genesis, GenesisParams, GenesisRequest};
use crate::inflight::{InFlight, InFlightGuard};
use crate::schema::Schema;
use crate::step::Step;
use crate::validate::{Validation, to_checksum_address};
use crate::wallet::WalletProvider;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

// =============================================================================
// NAVIGATION RESULT
// =============================================================================

/// Outcome of a navigation request.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Navigation {
    Moved { from: Step, to: Step },
    Denied { reason: DenyReason },
}

impl Navigation {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    fn denied(reason: DenyReason) -> Self {
        Self::Denied { reason }
    }
}

/// Why a navigation request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    /// Required fields are missing or invalid.
    StepIncomplete { step: Step, fields: Vec<FieldKey> },
    /// The genesis step needs a generated genesis.
    GenesisMissing,
    /// The genesis was derived from older inputs.
    GenesisStale,
    AtLastStep,
    AtFirstStep,
    /// Jump target is past the high-water mark.
    Locked { step: Step, max_advanced: Step },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepIncomplete { step, fields } => {
                let names: Vec<_> = fields.iter().map(|k| k.name()).collect();
                write!(f, "step {step} needs valid {}", names.join(", "))
            }
            Self::GenesisMissing => f.write_str("generate a genesis first"),
            Self::GenesisStale => f.write_str("inputs changed since the genesis was generated; regenerate it"),
            Self::AtLastStep => f.write_str("already at the last step"),
            Self::AtFirstStep => f.write_str("already at the first step"),
            Self::Locked { step, max_advanced } => {
                write!(f, "step {step} is not unlocked yet (furthest reached: {max_advanced})")
            }
        }
    }
}

// =============================================================================
// REGENERATION TICKET
// =============================================================================

/// An in-flight genesis derivation.
///
/// Holds the wizard's in-flight slot until it is passed back to
/// [`Wizard::complete_regeneration`] or dropped.
#[derive(Debug)]
pub struct Regeneration {
    guard: InFlightGuard,
    request: GenesisRequest,
}

impl Regeneration {
    /// The snapshot this derivation works from.
    #[must_use]
    pub fn request(&self) -> &GenesisRequest {
        &self.request
    }

    /// Run the derivation on the captured snapshot.
    pub fn derive(&self) -> Result<(Genesis, String), GenesisGenerationError> {
        self.request.render()
    }
}

#[derive(Debug, Clone)]
struct GeneratedGenesis {
    genesis: Genesis,
    json: String,
    source: GenesisRequest,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Per-step view for the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: Step,
    pub title: &'static str,
    pub current: bool,
    pub unlocked: bool,
    pub satisfied: bool,
}

/// Read-only view of the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub current_step: Step,
    pub max_advanced_step: Step,
    pub fields: BTreeMap<FieldKey, FieldEntry>,
    pub genesis_string: Option<String>,
    pub genesis_stale: bool,
    pub is_regenerating: bool,
    pub last_genesis_error: Option<String>,
    pub steps: Vec<StepStatus>,
}

// =============================================================================
// WIZARD
// =============================================================================

/// A wizard session.
#[derive(Debug)]
pub struct Wizard {
    schema: Schema,
    params: GenesisParams,
    current_step: Step,
    max_advanced_step: Step,
    fields: BTreeMap<FieldKey, FieldEntry>,
    genesis: Option<GeneratedGenesis>,
    last_genesis_error: Option<GenesisGenerationError>,
    in_flight: InFlight,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// A fresh session with the standard schema and default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_schema(Schema::standard(), GenesisParams::default())
    }

    /// A fresh session with the standard schema and custom parameters.
    #[must_use]
    pub fn with_params(params: GenesisParams) -> Self {
        Self::with_schema(Schema::standard(), params)
    }

    #[must_use]
    pub fn with_schema(schema: Schema, params: GenesisParams) -> Self {
        Self {
            schema,
            params,
            current_step: Step::FIRST,
            max_advanced_step: Step::FIRST,
            fields: BTreeMap::new(),
            genesis: None,
            last_genesis_error: None,
            in_flight: InFlight::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn max_advanced_step(&self) -> Step {
        self.max_advanced_step
    }

    pub fn field(&self, key: FieldKey) -> Option<&FieldEntry> {
        self.fields.get(&key)
    }

    pub fn fields(&self) -> &BTreeMap<FieldKey, FieldEntry> {
        &self.fields
    }

    pub fn params(&self) -> &GenesisParams {
        &self.params
    }

    /// The last successfully derived genesis JSON, stale or not.
    pub fn genesis_string(&self) -> Option<&str> {
        self.genesis.as_ref().map(|g| g.json.as_str())
    }

    pub fn genesis(&self) -> Option<&Genesis> {
        self.genesis.as_ref().map(|g| &g.genesis)
    }

    /// True iff a genesis exists and the inputs changed since it was derived.
    pub fn is_genesis_stale(&self) -> bool {
        self.genesis
            .as_ref()
            .is_some_and(|g| g.source.fields() != &self.fields || g.source.params() != &self.params)
    }

    /// The genesis JSON, only if it matches the current inputs.
    pub fn fresh_genesis_string(&self) -> Option<&str> {
        if self.is_genesis_stale() {
            None
        } else {
            self.genesis_string()
        }
    }

    pub fn is_regenerating(&self) -> bool {
        self.in_flight.is_busy()
    }

    pub fn last_genesis_error(&self) -> Option<&GenesisGenerationError> {
        self.last_genesis_error.as_ref()
    }

    /// True iff `step` has been legitimately reached.
    pub fn is_step_unlocked(&self, step: Step) -> bool {
        step <= self.max_advanced_step
    }

    /// Required fields of `step` that are absent or invalid.
    pub fn missing_fields(&self, step: Step) -> Vec<FieldKey> {
        self.schema
            .requirement(step)
            .fields
            .into_iter()
            .filter(|key| !self.fields.get(key).is_some_and(FieldEntry::is_valid))
            .collect()
    }

    /// True iff every requirement of `step` is met.
    pub fn is_step_satisfied(&self, step: Step) -> bool {
        self.unsatisfied_reason(step).is_none()
    }

    fn unsatisfied_reason(&self, step: Step) -> Option<DenyReason> {
        let missing = self.missing_fields(step);
        if !missing.is_empty() {
            return Some(DenyReason::StepIncomplete {
                step,
                fields: missing,
            });
        }
        if self.schema.requirement(step).needs_genesis {
            return self.genesis_unusable();
        }
        None
    }

    fn genesis_unusable(&self) -> Option<DenyReason> {
        if self.genesis.is_none() {
            Some(DenyReason::GenesisMissing)
        } else if self.is_genesis_stale() {
            Some(DenyReason::GenesisStale)
        } else {
            None
        }
    }

    /// Genesis may be (re)built while it is the furthest step reached, or
    /// from the genesis step itself once the artifact has gone stale.
    fn genesis_step_open(&self) -> bool {
        self.max_advanced_step == Step::Genesis
            || (self.current_step == Step::Genesis && self.is_genesis_stale())
    }

    /// Whether the "generate genesis" action should be enabled.
    pub fn can_regenerate(&self) -> bool {
        !self.is_regenerating()
            && self.genesis_step_open()
            && self.fields.contains_key(&FieldKey::EvmChainId)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            current_step: self.current_step,
            max_advanced_step: self.max_advanced_step,
            fields: self.fields.clone(),
            genesis_string: self.genesis_string().map(str::to_string),
            genesis_stale: self.is_genesis_stale(),
            is_regenerating: self.is_regenerating(),
            last_genesis_error: self.last_genesis_error.as_ref().map(|e| e.to_string()),
            steps: Step::ALL
                .iter()
                .map(|&step| StepStatus {
                    step,
                    title: step.title(),
                    current: step == self.current_step,
                    unlocked: self.is_step_unlocked(step),
                    satisfied: self.is_step_satisfied(step),
                })
                .collect(),
        }
    }

    // -------------------------------------------------------------------------
    // Field updates
    // -------------------------------------------------------------------------

    /// Store a value and its validation result. Does not move the step.
    pub fn set_field(&mut self, key: FieldKey, value: FieldValue) -> Validation {
        let validation = self.schema.validate(key, &value);
        let value = match value {
            FieldValue::Address(addr) if validation.is_valid() => {
                FieldValue::Address(to_checksum_address(&addr).unwrap_or(addr))
            }
            other => other,
        };
        debug!(field = %key, valid = validation.is_valid(), "field updated");
        self.fields.insert(
            key,
            FieldEntry {
                value,
                validation: validation.clone(),
            },
        );
        validation
    }

    /// Parse raw text for `key` and store it.
    ///
    /// Text that cannot be parsed into the key's type is rejected without
    /// touching the stored value.
    pub fn set_field_raw(&mut self, key: FieldKey, raw: &str) -> Validation {
        match key.parse_value(raw) {
            Ok(value) => self.set_field(key, value),
            Err(e) => Validation::invalid(e.to_string()),
        }
    }

    pub fn clear_field(&mut self, key: FieldKey) -> Option<FieldEntry> {
        debug!(field = %key, "field cleared");
        self.fields.remove(&key)
    }

    /// Read the provider and accept its address only if it validates.
    pub fn connect_wallet(&mut self, provider: &dyn WalletProvider) -> Validation {
        let Some(address) = provider.wallet_address() else {
            return Validation::invalid("no wallet connected");
        };
        let value = FieldValue::Address(address);
        let validation = self.schema.validate(FieldKey::WalletAddress, &value);
        if validation.is_valid() {
            self.set_field(FieldKey::WalletAddress, value)
        } else {
            warn!(reason = validation.reason().unwrap_or_default(), "wallet address rejected");
            validation
        }
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Move to the next step if the current one is satisfied.
    pub fn advance(&mut self) -> Navigation {
        let from = self.current_step;
        let Some(to) = from.next() else {
            return Navigation::denied(DenyReason::AtLastStep);
        };
        if let Some(reason) = self.unsatisfied_reason(from) {
            debug!(step = %from, %reason, "advance denied");
            return Navigation::denied(reason);
        }
        self.current_step = to;
        self.max_advanced_step = self.max_advanced_step.max(to);
        debug!(%from, %to, max = %self.max_advanced_step, "advanced");
        Navigation::Moved { from, to }
    }

    /// Move to the previous step.
    pub fn go_back(&mut self) -> Navigation {
        let from = self.current_step;
        match from.prev() {
            Some(to) => {
                self.current_step = to;
                Navigation::Moved { from, to }
            }
            None => Navigation::denied(DenyReason::AtFirstStep),
        }
    }

    /// Move to any step that has already been reached.
    ///
    /// Steps after the genesis step stay out of reach while the genesis is
    /// missing or stale.
    pub fn jump_to(&mut self, step: Step) -> Navigation {
        if !self.is_step_unlocked(step) {
            return Navigation::denied(DenyReason::Locked {
                step,
                max_advanced: self.max_advanced_step,
            });
        }
        let blocked = if step > Step::Genesis {
            self.genesis_unusable()
        } else {
            None
        };
        if let Some(reason) = blocked {
            debug!(%step, %reason, "jump denied");
            return Navigation::denied(reason);
        }
        let from = self.current_step;
        self.current_step = step;
        Navigation::Moved { from, to: step }
    }

    // -------------------------------------------------------------------------
    // Genesis
    // -------------------------------------------------------------------------

    /// Replace the chain parameters. An existing genesis becomes stale.
    pub fn set_params(&mut self, params: GenesisParams) {
        self.params = params;
    }

    /// Take the in-flight slot and snapshot the inputs for a derivation.
    ///
    /// Checks, in order: no other derivation in flight; a chain id is
    /// present; the genesis step is the furthest step reached, or it is the
    /// current step and the existing genesis is stale. The last genesis error
    /// is only cleared once every check has passed.
    pub fn begin_regeneration(&mut self) -> Result<Regeneration, WizardError> {
        let guard = self
            .in_flight
            .try_acquire()
            .ok_or(PreconditionViolation::RegenerationInFlight)?;

        if !self.fields.contains_key(&FieldKey::EvmChainId) {
            let err = GenesisGenerationError::MissingChainId;
            warn!(%err, "genesis generation refused");
            self.last_genesis_error = Some(err.clone());
            return Err(err.into());
        }

        if !self.genesis_step_open() {
            return Err(PreconditionViolation::GenesisStepNotCurrent {
                max_advanced: self.max_advanced_step,
            }
            .into());
        }

        self.last_genesis_error = None;
        debug!("genesis generation started");
        Ok(Regeneration {
            guard,
            request: GenesisRequest::new(self.fields.clone(), self.params.clone()),
        })
    }

    /// Store the outcome of a derivation and release the in-flight slot.
    ///
    /// On failure the previous genesis is kept and the error is recorded.
    pub fn complete_regeneration(
        &mut self,
        ticket: Regeneration,
        result: Result<(Genesis, String), GenesisGenerationError>,
    ) -> Result<(), WizardError> {
        if !ticket.guard.belongs_to(&self.in_flight) {
            return Err(PreconditionViolation::ForeignTicket.into());
        }

        let Regeneration { guard, request } = ticket;
        let outcome = match result {
            Ok((genesis, json)) => {
                info!(chain_id = genesis.chain_id(), bytes = json.len(), "genesis generated");
                self.genesis = Some(GeneratedGenesis {
                    genesis,
                    json,
                    source: request,
                });
                Ok(())
            }
            Err(err) => {
                warn!(%err, "genesis generation failed");
                self.last_genesis_error = Some(err.clone());
                Err(err.into())
            }
        };
        drop(guard);
        outcome
    }

    /// Derive the genesis synchronously.
    pub fn regenerate_genesis(&mut self) -> Result<(), WizardError> {
        let ticket = self.begin_regeneration()?;
        let result = ticket.derive();
        self.complete_regeneration(ticket, result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
