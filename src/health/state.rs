//! Backend liveness state machine.
//!
//! # States
//! - Unknown: never probed; treated as alive
//! - Healthy: backend receives traffic
//! - Unhealthy: backend skipped by the dispatcher
//!
//! # State Transitions
//! ```text
//! Unknown/Healthy → Unhealthy: consecutive failures >= unhealthy_threshold
//! Unknown/Unhealthy → Healthy: consecutive successes >= healthy_threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping
//! - Written only by health collaborators, read by the dispatcher
//! - Plain atomics; a read never observes a torn state

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Liveness of a single backend.
#[derive(Debug, Default)]
pub struct Liveness {
    state: AtomicU8,
    consecutive_failures: AtomicUsize,
    consecutive_successes: AtomicUsize,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Acquire))
    }

    /// True unless the backend has been marked unhealthy.
    pub fn is_alive(&self) -> bool {
        self.state() != HealthState::Unhealthy
    }

    /// Force the state, bypassing thresholds.
    pub fn set_alive(&self, alive: bool) {
        let state = if alive { HealthState::Healthy } else { HealthState::Unhealthy };
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.consecutive_successes.store(0, Ordering::Relaxed);
        self.state.store(state as u8, Ordering::Release);
    }

    /// Report a successful probe. Returns true if this caused a transition to Healthy.
    pub fn mark_success(&self, healthy_threshold: usize) -> bool {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.state() == HealthState::Healthy {
            return false;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.consecutive_successes.store(0, Ordering::Relaxed);
            self.state.store(HealthState::Healthy as u8, Ordering::Release);
            return true;
        }
        false
    }

    /// Report a failed probe. Returns true if this caused a transition to Unhealthy.
    pub fn mark_failure(&self, unhealthy_threshold: usize) -> bool {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.state() == HealthState::Unhealthy {
            return false;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.consecutive_failures.store(0, Ordering::Relaxed);
            self.state.store(HealthState::Unhealthy as u8, Ordering::Release);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_counts_as_alive() {
        let liveness = Liveness::new();
        assert_eq!(liveness.state(), HealthState::Unknown);
        assert!(liveness.is_alive());
    }

    #[test]
    fn test_failure_threshold() {
        let liveness = Liveness::new();

        assert!(!liveness.mark_failure(3));
        assert!(!liveness.mark_failure(3));
        assert!(liveness.is_alive());

        assert!(liveness.mark_failure(3));
        assert!(!liveness.is_alive());

        // Already unhealthy, no second transition
        assert!(!liveness.mark_failure(3));
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let liveness = Liveness::new();
        liveness.mark_failure(2);
        liveness.mark_success(2);
        liveness.mark_failure(2);
        assert!(liveness.is_alive());
    }

    #[test]
    fn test_recovery_needs_healthy_threshold() {
        let liveness = Liveness::new();
        liveness.set_alive(false);
        assert!(!liveness.is_alive());

        assert!(!liveness.mark_success(2));
        assert!(!liveness.is_alive());
        assert!(liveness.mark_success(2));
        assert!(liveness.is_alive());
        assert_eq!(liveness.state(), HealthState::Healthy);
    }

    #[test]
    fn test_set_alive_overrides() {
        let liveness = Liveness::new();
        liveness.set_alive(false);
        assert_eq!(liveness.state(), HealthState::Unhealthy);
        liveness.set_alive(true);
        assert_eq!(liveness.state(), HealthState::Healthy);
    }
}
