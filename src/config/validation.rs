//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, threshold >= 1)
//! - Catch half-configured media credentials early
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the gateway

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A base URL did not parse.
    InvalidBaseUrl { field: &'static str, reason: String },
    /// The breaker threshold must be at least 1.
    ZeroFailureThreshold,
    /// The request timeout must be positive.
    NonPositiveTimeout,
    /// The breaker cooldown must not be negative.
    NegativeCooldown,
    /// Some but not all media credentials are set.
    PartialMediaCredentials,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBaseUrl { field, reason } => {
                write!(f, "{} is not a valid URL ({})", field, reason)
            }
            ValidationError::ZeroFailureThreshold => {
                write!(f, "breaker.failure_threshold must be >= 1")
            }
            ValidationError::NonPositiveTimeout => {
                write!(f, "timeouts.request_secs must be > 0")
            }
            ValidationError::NegativeCooldown => {
                write!(f, "breaker.cooldown_secs must be >= 0")
            }
            ValidationError::PartialMediaCredentials => {
                write!(
                    f,
                    "media credentials must be all set or all empty (cloud_name, api_key, api_secret)"
                )
            }
        }
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = Url::parse(&config.inference.base_url) {
        errors.push(ValidationError::InvalidBaseUrl {
            field: "inference.base_url",
            reason: e.to_string(),
        });
    }
    if let Err(e) = Url::parse(&config.media.base_url) {
        errors.push(ValidationError::InvalidBaseUrl {
            field: "media.base_url",
            reason: e.to_string(),
        });
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }
    if !(config.timeouts.request_secs > 0.0) {
        errors.push(ValidationError::NonPositiveTimeout);
    }
    if config.breaker.cooldown_secs < 0.0 {
        errors.push(ValidationError::NegativeCooldown);
    }

    let credentials = [
        &config.media.cloud_name,
        &config.media.api_key,
        &config.media.api_secret,
    ];
    let set = credentials.iter().filter(|c| !c.is_empty()).count();
    if set != 0 && set != credentials.len() {
        errors.push(ValidationError::PartialMediaCredentials);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
