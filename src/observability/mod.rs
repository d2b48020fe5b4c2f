//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! executor / breakers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout by default)
//!     → Whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured logging; every executor attempt carries a call id
//! - Metrics are cheap (atomic increments) and recorded unconditionally;
//!   without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
