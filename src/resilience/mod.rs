//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to upstream:
//!     → circuit_breaker.rs (gate: reject immediately while open)
//!     → attempt (bounded by the per-request timeout)
//!     → On transient failure: backoff.rs (linear delay), then retry
//!     → Outcome reported back to circuit_breaker.rs
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, owned by the gateway (no global state)
//! - Breaker rejections cost no network I/O
//! - Backoff is linear and deterministic; the per-attempt timeout already
//!   bounds worst-case latency

pub mod backoff;
pub mod circuit_breaker;

pub use circuit_breaker::CircuitBreaker;
