//! # Wizard Driver
//!
//! Hosts a [`Wizard`] on the tokio runtime.
//!
//! Genesis derivation runs on the blocking pool under a deadline. The wizard
//! lock is only held to take and to return the regeneration ticket, so other
//! tasks can read `is_regenerating()` while the derivation runs.

use l1_launcher_core::{Genesis, GenesisGenerationError, Wizard, WizardError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tracing::debug;

type Rendered = Result<(Genesis, String), GenesisGenerationError>;

/// Shared handle to a wizard session.
#[derive(Debug, Clone)]
pub struct WizardDriver {
    wizard: Arc<Mutex<Wizard>>,
    timeout: Duration,
}

impl WizardDriver {
    pub fn new(wizard: Wizard, timeout: Duration) -> Self {
        Self {
            wizard: Arc::new(Mutex::new(wizard)),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Lock the wizard for synchronous operations.
    pub async fn lock(&self) -> MutexGuard<'_, Wizard> {
        self.wizard.lock().await
    }

    /// Derive the genesis off-thread and store the outcome.
    ///
    /// Same preconditions as [`Wizard::regenerate_genesis`]. A derivation
    /// that misses the deadline is recorded as
    /// [`GenesisGenerationError::TimedOut`]; one that panics as
    /// [`GenesisGenerationError::Aborted`].
    pub async fn regenerate_genesis(&self) -> Result<(), WizardError> {
        let ticket = self.wizard.lock().await.begin_regeneration()?;
        let request = ticket.request().clone();

        debug!(timeout_secs = self.timeout.as_secs(), "deriving genesis on blocking pool");
        let outcome =
            tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(move || request.render())).await;
        let result = settle(outcome, self.timeout);

        self.wizard.lock().await.complete_regeneration(ticket, result)
    }
}

/// Flatten the timeout and join layers into a derivation result.
fn settle(outcome: Result<Result<Rendered, JoinError>, Elapsed>, timeout: Duration) -> Rendered {
    match outcome {
        Ok(Ok(rendered)) => rendered,
        Ok(Err(join)) => Err(GenesisGenerationError::Aborted(join.to_string())),
        Err(_) => Err(GenesisGenerationError::TimedOut {
            secs: timeout.as_secs(),
        }),
    }
}
