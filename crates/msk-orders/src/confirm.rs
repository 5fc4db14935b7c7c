//! Confirm request-state machine.
//!
//! The delivery confirm action moves through an explicit machine:
//!
//! ```text
//!   Idle ──begin()──► InFlight ──settle_success()──► Settled (terminal)
//!    ▲                   │
//!    └────drop (failure)─┘
//! ```
//!
//! [`ConfirmGuard::begin`] hands out at most one [`ConfirmPermit`] at a time.
//! While a permit is live, every further confirm is refused locally, before
//! any network call, which is what keeps a double-click from double-crediting
//! a wallet. A failed request drops its permit and the guard returns to
//! `Idle` so the operator can retry; a successful one settles the guard for
//! good (the order is delivered and the lock gate takes over from there).
//!
//! This is client-side exclusion only. The authoritative at-most-once
//! guarantee comes from the repository rejecting a second delivery of an
//! already-delivered order.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::gateway::GateRefusal;

const IDLE: u8 = 0;
const IN_FLIGHT: u8 = 1;
const SETTLED: u8 = 2;

/// Observable state of a [`ConfirmGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    Idle,
    InFlight,
    Settled,
}

/// Mutual exclusion for one order's confirm action.
#[derive(Debug, Default)]
pub struct ConfirmGuard {
    state: AtomicU8,
}

impl ConfirmGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConfirmState {
        match self.state.load(Ordering::Acquire) {
            IN_FLIGHT => ConfirmState::InFlight,
            SETTLED => ConfirmState::Settled,
            _ => ConfirmState::Idle,
        }
    }

    /// Claim the confirm action.
    ///
    /// Refused with [`GateRefusal::ConfirmInFlight`] while another permit is
    /// live, and with [`GateRefusal::ConfirmSettled`] once a delivery has
    /// succeeded through this guard.
    pub(crate) fn begin(&self) -> Result<ConfirmPermit<'_>, GateRefusal> {
        match self
            .state
            .compare_exchange(IDLE, IN_FLIGHT, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(ConfirmPermit {
                guard: self,
                settled: false,
            }),
            Err(IN_FLIGHT) => Err(GateRefusal::ConfirmInFlight),
            Err(_) => Err(GateRefusal::ConfirmSettled),
        }
    }
}

/// Proof that the caller holds the confirm action.
///
/// Cannot be constructed outside this crate. Dropping the permit without an
/// explicit success (failure path, panic unwind) returns the guard to `Idle`.
pub struct ConfirmPermit<'g> {
    guard: &'g ConfirmGuard,
    settled: bool,
}

impl ConfirmPermit<'_> {
    /// Mark the delivery as succeeded; the guard becomes `Settled` and never
    /// hands out another permit.
    pub(crate) fn settle_success(mut self) {
        self.settled = true;
        self.guard.state.store(SETTLED, Ordering::Release);
    }
}

impl Drop for ConfirmPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.guard.state.store(IDLE, Ordering::Release);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_refused_while_permit_live() {
        let guard = ConfirmGuard::new();
        let permit = guard.begin().unwrap();
        assert_eq!(guard.state(), ConfirmState::InFlight);
        assert!(matches!(guard.begin(), Err(GateRefusal::ConfirmInFlight)));
        drop(permit);
        assert_eq!(guard.state(), ConfirmState::Idle);
    }

    #[test]
    fn dropped_permit_allows_retry() {
        let guard = ConfirmGuard::new();
        drop(guard.begin().unwrap()); // request failed
        assert!(guard.begin().is_ok());
    }

    #[test]
    fn settled_guard_refuses_forever() {
        let guard = ConfirmGuard::new();
        guard.begin().unwrap().settle_success();
        assert_eq!(guard.state(), ConfirmState::Settled);
        assert!(matches!(guard.begin(), Err(GateRefusal::ConfirmSettled)));
    }
}
