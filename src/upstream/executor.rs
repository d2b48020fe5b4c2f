//! Retrying request executor.
//!
//! # Responsibilities
//! - Gate every call on the upstream's circuit breaker
//! - Classify each attempt outcome (expected / transient / fatal)
//! - Retry transient outcomes with linear backoff
//! - Report terminal outcomes to the breaker
//!
//! # Design Decisions
//! - Transient HTTP statuses (408, 429, 5xx) count against the breaker once,
//!   on exhaustion, not per retry; timeouts and other network errors count
//!   per attempt
//! - Non-transient unexpected statuses fail fast; no retry
//! - Each attempt gets its own full timeout budget; sleeps suspend only the
//!   calling task

use std::time::Instant;

use reqwest::{Client, Method, Response, StatusCode};
use uuid::Uuid;

use crate::config::RetryConfig;
use crate::error::{snippet, GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::resilience::backoff::linear_backoff;
use crate::resilience::CircuitBreaker;

/// Character budget for body snippets embedded in executor errors.
const SNIPPET_MAX_CHARS: usize = 512;

/// Statuses worth retrying: request timeout, too-many-requests, any 5xx.
pub(crate) fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429) || status.is_server_error()
}

/// Issue one JSON request with retries, gated by `breaker`.
///
/// Returns the raw response on the expected status; the caller parses it.
pub(crate) async fn execute(
    client: &Client,
    breaker: &CircuitBreaker,
    retry: &RetryConfig,
    method: Method,
    url: &str,
    body: &serde_json::Value,
    expected: StatusCode,
) -> GatewayResult<Response> {
    breaker.allow()?;

    let call_id = Uuid::new_v4();
    let attempts = retry.max_retries + 1;
    let mut last_err: Option<GatewayError> = None;
    // Whether the most recent failure was a transient HTTP status (breaker
    // accounting for those is deferred to exhaustion).
    let mut last_was_transient_status = false;

    for attempt in 0..attempts {
        let started = Instant::now();
        match client
            .request(method.clone(), url)
            .json(body)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                metrics::record_upstream_request(breaker.name(), status.as_u16(), started);

                if status == expected {
                    breaker.report_success();
                    tracing::debug!(
                        call_id = %call_id,
                        upstream = breaker.name(),
                        attempt,
                        url,
                        "upstream call succeeded"
                    );
                    return Ok(response);
                }

                if is_transient(status) {
                    tracing::warn!(
                        call_id = %call_id,
                        upstream = breaker.name(),
                        attempt,
                        status = status.as_u16(),
                        url,
                        "transient upstream status"
                    );
                    last_err = Some(GatewayError::UpstreamUnavailable {
                        reason: format!("{url} returned {status}"),
                        retry_after: None,
                    });
                    last_was_transient_status = true;
                    if attempt + 1 < attempts {
                        metrics::record_retry(breaker.name());
                        tokio::time::sleep(linear_backoff(retry.backoff_unit(), attempt)).await;
                    }
                    continue;
                }

                // Anything else is a hard contract violation: fail fast.
                breaker.report_failure();
                let body_text = response.text().await.unwrap_or_default();
                tracing::error!(
                    call_id = %call_id,
                    upstream = breaker.name(),
                    attempt,
                    status = status.as_u16(),
                    url,
                    "unexpected upstream status"
                );
                return Err(GatewayError::BadUpstreamResponse {
                    url: url.to_string(),
                    status: status.as_u16(),
                    snippet: snippet(&body_text, SNIPPET_MAX_CHARS),
                });
            }
            Err(err) => {
                breaker.report_failure();
                last_was_transient_status = false;
                if err.is_timeout() {
                    metrics::record_upstream_error(breaker.name(), "timeout");
                    tracing::warn!(
                        call_id = %call_id,
                        upstream = breaker.name(),
                        attempt,
                        url,
                        "upstream attempt timed out"
                    );
                    last_err = Some(GatewayError::UpstreamTimeout {
                        url: url.to_string(),
                    });
                } else {
                    metrics::record_upstream_error(breaker.name(), "network");
                    tracing::warn!(
                        call_id = %call_id,
                        upstream = breaker.name(),
                        attempt,
                        error = %err,
                        url,
                        "upstream attempt failed"
                    );
                    last_err = Some(GatewayError::UpstreamUnavailable {
                        reason: format!("error calling {url}: {err}"),
                        retry_after: None,
                    });
                }
                if attempt + 1 < attempts {
                    metrics::record_retry(breaker.name());
                    tokio::time::sleep(linear_backoff(retry.backoff_unit(), attempt)).await;
                }
            }
        }
    }

    // Transient statuses were never reported along the way; the exhausted
    // loop is the terminal outcome the breaker gets to see.
    if last_was_transient_status {
        breaker.report_failure();
    }
    Err(last_err.unwrap_or_else(|| GatewayError::UpstreamUnavailable {
        reason: format!("failed to call {url}"),
        retry_after: None,
    }))
}
