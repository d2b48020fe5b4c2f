//! Configuration loading from the environment and from disk.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::error::GatewayError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, reason } => {
                write!(f, "Invalid value for {}: {}", var, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build and validate configuration from environment variables.
///
/// Every variable is optional; anything unset keeps its default. Durations
/// are given in (possibly fractional) seconds.
pub fn config_from_env() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();

    if let Some(v) = env_string("OLLAMA_BASE_URL") {
        config.inference.base_url = v;
    }
    if let Some(v) = env_string("CLOUDINARY_BASE_URL") {
        config.media.base_url = v;
    }
    if let Some(v) = env_string("CLOUDINARY_CLOUD_NAME") {
        config.media.cloud_name = v;
    }
    if let Some(v) = env_string("CLOUDINARY_API_KEY") {
        config.media.api_key = v;
    }
    if let Some(v) = env_string("CLOUDINARY_API_SECRET") {
        config.media.api_secret = v;
    }
    if let Some(v) = env_string("CLOUDINARY_UPLOAD_PRESET") {
        config.media.upload_preset = v;
    }

    if let Some(v) = env_parse::<f64>("GATEWAY_TIMEOUT")? {
        config.timeouts.request_secs = v;
    }
    if let Some(v) = env_parse::<u32>("GATEWAY_RETRIES")? {
        config.retries.max_retries = v;
    }
    if let Some(v) = env_parse::<f64>("GATEWAY_RETRY_BACKOFF")? {
        config.retries.backoff_ms = (v * 1000.0).round() as u64;
    }
    if let Some(v) = env_parse::<u32>("GATEWAY_CB_FAILS")? {
        config.breaker.failure_threshold = v;
    }
    if let Some(v) = env_parse::<f64>("GATEWAY_CB_COOLDOWN")? {
        config.breaker.cooldown_secs = v;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read a non-empty string variable.
fn env_string(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

/// Read and parse a variable, distinguishing "unset" from "unparseable".
fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_string(var) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| ConfigError::Env {
            var,
            reason: e.to_string(),
        }),
    }
}
