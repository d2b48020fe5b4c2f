//! Metrics collection.
//!
//! # Metrics
//! - `gateway_upstream_requests_total` (counter): attempts by upstream, status
//! - `gateway_upstream_request_duration_seconds` (histogram): attempt latency
//! - `gateway_upstream_retries_total` (counter): retries by upstream
//! - `gateway_breaker_rejections_total` (counter): calls rejected while open
//! - `gateway_breaker_transitions_total` (counter): open/closed transitions
//!
//! No exporter is bundled; the embedding application installs its recorder.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record one completed HTTP attempt against an upstream.
pub fn record_upstream_request(upstream: &'static str, status: u16, started: Instant) {
    counter!(
        "gateway_upstream_requests_total",
        "upstream" => upstream,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_upstream_request_duration_seconds",
        "upstream" => upstream
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record a network-level attempt failure (no HTTP status available).
pub fn record_upstream_error(upstream: &'static str, kind: &'static str) {
    counter!(
        "gateway_upstream_errors_total",
        "upstream" => upstream,
        "kind" => kind
    )
    .increment(1);
}

/// Record that an attempt is being retried.
pub fn record_retry(upstream: &'static str) {
    counter!("gateway_upstream_retries_total", "upstream" => upstream).increment(1);
}

/// Record a call rejected by an open breaker.
pub fn record_breaker_rejection(upstream: &'static str) {
    counter!("gateway_breaker_rejections_total", "upstream" => upstream).increment(1);
}

/// Record a breaker state transition.
pub fn record_breaker_transition(upstream: &'static str, to_state: &'static str) {
    counter!(
        "gateway_breaker_transitions_total",
        "upstream" => upstream,
        "state" => to_state
    )
    .increment(1);
}
