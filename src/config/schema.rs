//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files; the
//! environment loader fills the same structure.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Model-inference upstream (generation + embeddings).
    pub inference: InferenceConfig,

    /// Media-hosting upstream (uploads).
    pub media: MediaConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration for the shared executor.
    pub retries: RetryConfig,

    /// Circuit breaker settings (applied per upstream).
    pub breaker: BreakerConfig,
}

/// Model-inference upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the inference server.
    pub base_url: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
        }
    }
}

/// Media-hosting upstream configuration.
///
/// Credentials default to empty; uploads fail with a configuration error
/// until all three of cloud name, key and secret are set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Base URL of the upload API.
    pub base_url: String,

    /// Cloud name (first path segment of the upload endpoint).
    pub cloud_name: String,

    /// API key for basic auth.
    pub api_key: String,

    /// API secret for basic auth.
    pub api_secret: String,

    /// Upload preset forwarded with every upload.
    pub upload_preset: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloudinary.com/v1_1".to_string(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            upload_preset: String::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-attempt request timeout in seconds. Each retry attempt gets its
    /// own full budget; no deadline spans the whole retry loop.
    pub request_secs: f64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30.0 }
    }
}

impl TimeoutConfig {
    /// Per-attempt timeout as a `Duration`.
    pub fn request(&self) -> Duration {
        Duration::from_secs_f64(self.request_secs)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first attempt.
    pub max_retries: u32,

    /// Backoff unit in milliseconds; sleep is unit × attempt number.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_ms: 600,
        }
    }
}

impl RetryConfig {
    /// Backoff unit as a `Duration`.
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before the next check closes it.
    pub cooldown_secs: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 4,
            cooldown_secs: 10.0,
        }
    }
}

impl BreakerConfig {
    /// Cooldown as a `Duration`.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }
}
