//! # L1 Launcher Core
//!
//! The deterministic wizard engine behind the L1 launcher.
//!
//! A wizard session walks the user through a fixed, ordered list of
//! [`Step`]s. Each step binds one or more [`FieldKey`]s whose values must pass
//! their [`Validator`] before the step counts as satisfied. Once the chain
//! parameters are in place the session derives a genesis document through the
//! [`genesis`] builder.
//!
//! ```text
//! user input ──► validate ──► Wizard (fields, steps, high-water mark)
//!                                  │
//!                     explicit "generate" action
//!                                  ▼
//!                         GenesisRequest::derive ──► genesis JSON
//! ```
//!
//! The crate is synchronous and free of I/O. Hosts that want to run the
//! derivation off-thread use the two-phase [`Wizard::begin_regeneration`] /
//! [`Wizard::complete_regeneration`] pair.

pub mod error;
pub mod field;
pub mod genesis;
pub mod inflight;
pub mod schema;
pub mod step;
pub mod validate;
pub mod wallet;
pub mod wizard;

pub use error::{GenesisGenerationError, PreconditionViolation, WizardError};
pub use field::{Allocation, FieldEntry, FieldKey, FieldValue};
pub use genesis::{Genesis, GenesisParams, GenesisRequest};
pub use inflight::{InFlight, InFlightGuard};
pub use schema::Schema;
pub use step::Step;
pub use validate::{Validation, Validator};
pub use wallet::WalletProvider;
pub use wizard::{DenyReason, Navigation, Regeneration, StepStatus, Wizard, WizardSnapshot};
