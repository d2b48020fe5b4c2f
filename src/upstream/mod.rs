//! Upstream call layer.
//!
//! # Data Flow
//! ```text
//! Gateway operation
//!     → adapter builds payload (inference.rs / media.rs)
//!     → executor.rs (breaker gate → attempt → classify → backoff → retry)
//!     → upstream HTTP service
//!     → adapter parses and normalizes the response
//!     → typed result or GatewayError back to the caller
//! ```
//!
//! # Design Decisions
//! - Generation and embeddings share the pooled client and one breaker
//! - Uploads use a dedicated breaker and a per-call connection, and make
//!   exactly one attempt
//! - Adapters never return partial data on parse failure

pub mod executor;
pub mod inference;
pub mod media;
