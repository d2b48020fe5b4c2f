//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables (default path)
//!     → loader.rs (read & parse, defaults for anything unset)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! config file (TOML, used by the CLI)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs
//!     → GatewayConfig
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the gateway is constructed
//! - All fields have defaults so an empty environment still resolves
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{config_from_env, load_config, ConfigError};
pub use schema::{
    BreakerConfig, GatewayConfig, InferenceConfig, MediaConfig, RetryConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
