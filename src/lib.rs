//! Unified outbound gateway for external service calls.
//!
//! Single egress point for an application that talks to two unreliable
//! upstreams: a local model-inference server (text generation and
//! embeddings) and a media-hosting service (image upload).
//!
//! # Architecture Overview
//!
//! ```text
//! caller
//!   │
//!   ▼
//! ┌─────────────────────────────────────────────────────┐
//! │ Gateway (config, shared client, breaker per upstream)│
//! │   │                                                  │
//! │   ▼                                                  │
//! │ adapter (inference / media): build payload           │
//! │   │                                                  │
//! │   ▼                                                  │
//! │ executor: breaker gate → attempt → classify →        │
//! │           linear backoff → retry                     │
//! └───┼─────────────────────────────────────────────────┘
//!     ▼
//! upstream HTTP service
//!     │
//!     ▼
//! adapter parses response → typed result or GatewayError
//! ```

// Core subsystems
pub mod config;
pub mod gateway;
pub mod upstream;

// Cross-cutting concerns
pub mod error;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::Gateway;
