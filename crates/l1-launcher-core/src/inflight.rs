//! # In-Flight Guard
//!
//! Single-slot lock that allows at most one genesis derivation per wizard.
//!
//! Acquisition is non-blocking: a second caller gets `None` instead of
//! waiting. The flag is released when the [`InFlightGuard`] drops, which
//! covers success, failure, cancellation and unwinding alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared in-flight flag.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the slot. Returns `None` if it is already taken.
    #[must_use]
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Whether a guard is currently alive.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the in-flight slot. Releases it on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl InFlightGuard {
    /// Whether this guard was taken from `flag` (or one of its clones).
    #[must_use]
    pub fn belongs_to(&self, flag: &InFlight) -> bool {
        Arc::ptr_eq(&self.busy, &flag.busy)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let flag = InFlight::new();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_busy());
    }

    #[test]
    fn clones_share_the_slot() {
        let flag = InFlight::new();
        let other = flag.clone();
        let _guard = flag.try_acquire();
        assert!(other.is_busy());
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn guard_knows_its_origin() {
        let flag = InFlight::new();
        let stranger = InFlight::new();
        let guard = flag.try_acquire();
        assert!(guard.as_ref().is_some_and(|g| g.belongs_to(&flag)));
        assert!(!guard.as_ref().is_some_and(|g| g.belongs_to(&stranger)));
    }

    #[test]
    fn released_on_unwind() {
        let flag = InFlight::new();
        let inner = flag.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = inner.try_acquire();
            std::panic::panic_any("derivation blew up");
        });
        assert!(result.is_err());
        assert!(!flag.is_busy());
    }
}
