//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast without network I/O
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure count reaches threshold
//! Open → Closed: first allow() check after the cooldown elapses
//! ```
//!
//! There is no half-open probe phase and no external reset: a single check
//! after the cooldown closes the circuit again, and only time exits the
//! open state.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;

/// Mutable breaker state, guarded by one mutex per breaker instance.
#[derive(Debug)]
struct BreakerState {
    /// Consecutive failures since the last success.
    consecutive_failures: u32,
    /// When set, calls are rejected until this instant.
    open_until: Option<Instant>,
}

/// Point-in-time view of a breaker, for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerSnapshot {
    pub consecutive_failures: u32,
    /// Remaining cooldown if the circuit is currently open.
    pub open_remaining: Option<Duration>,
}

/// Circuit breaker for a single upstream.
///
/// All three operations take the same lock, so concurrent callers observe
/// consistent transitions. The lock is only ever held for the state
/// check/update itself, never across network I/O.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    failure_threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            name,
            failure_threshold,
            cooldown,
            state: Mutex::new(BreakerState {
                consecutive_failures: 0,
                open_until: None,
            }),
        }
    }

    /// Upstream name, used as the metrics/log label.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Gate a call: reject while the circuit is open, otherwise allow.
    ///
    /// If the cooldown has elapsed, the circuit closes on this check before
    /// allowing the call through.
    pub fn allow(&self) -> GatewayResult<()> {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        if let Some(open_until) = state.open_until {
            let now = Instant::now();
            if now < open_until {
                metrics::record_breaker_rejection(self.name);
                return Err(GatewayError::circuit_open(self.name, open_until - now));
            }
            state.consecutive_failures = 0;
            state.open_until = None;
            tracing::info!(upstream = self.name, "circuit closed after cooldown");
            metrics::record_breaker_transition(self.name, "closed");
        }
        Ok(())
    }

    /// Record a successful call: resets the failure count and closes the
    /// circuit unconditionally.
    pub fn report_success(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        state.consecutive_failures = 0;
        state.open_until = None;
    }

    /// Record a failed call; opens the circuit once the threshold is hit.
    pub fn report_failure(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.failure_threshold {
            state.open_until = Some(Instant::now() + self.cooldown);
            tracing::warn!(
                upstream = self.name,
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs_f64(),
                "circuit opened"
            );
            metrics::record_breaker_transition(self.name, "open");
        }
    }

    /// Snapshot of the current state (for monitoring).
    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.state.lock().expect("circuit breaker mutex poisoned");
        let now = Instant::now();
        BreakerSnapshot {
            consecutive_failures: state.consecutive_failures,
            open_remaining: state
                .open_until
                .and_then(|until| until.checked_duration_since(now)),
        }
    }
}
