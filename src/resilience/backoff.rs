//! Linear backoff between retry attempts.

use std::time::Duration;

/// Delay before the retry that follows `attempt` (0-indexed): unit × (attempt + 1).
pub fn linear_backoff(unit: Duration, attempt: u32) -> Duration {
    unit.saturating_mul(attempt + 1)
}
