//! Gateway error taxonomy.
//!
//! One base error kind distinguished by sub-kind; callers map these onto
//! their own outward-facing statuses. Errors are return-only values and are
//! never persisted.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level read timeout on the final exhausted attempt.
    #[error("timeout calling {url}")]
    UpstreamTimeout { url: String },

    /// Circuit open, transient statuses persisted through all retries, or a
    /// non-timeout network/protocol error.
    #[error("upstream unavailable: {reason}")]
    UpstreamUnavailable {
        reason: String,
        /// Remaining breaker cooldown when the circuit rejected the call.
        retry_after: Option<Duration>,
    },

    /// Non-transient unexpected status, or a body that failed to parse into
    /// the expected shape.
    #[error("bad upstream response from {url} (status {status}): {snippet}")]
    BadUpstreamResponse {
        url: String,
        status: u16,
        snippet: String,
    },

    /// Required configuration missing or invalid before any I/O.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Rejection issued by an open circuit breaker, carrying the remaining
    /// cooldown so callers can surface a retry hint.
    pub(crate) fn circuit_open(upstream: &str, remaining: Duration) -> Self {
        GatewayError::UpstreamUnavailable {
            reason: format!(
                "circuit open for {upstream}; retry in {:.1}s",
                remaining.as_secs_f64()
            ),
            retry_after: Some(remaining),
        }
    }

    /// Remaining cooldown, when this error came from an open breaker.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GatewayError::UpstreamUnavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Truncate a body (or parse error) to a bounded character budget for
/// inclusion in error messages.
pub(crate) fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
