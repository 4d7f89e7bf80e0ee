//! Time-related re-exports.
//!
//! - On native platforms: `tokio::time` for sleeping and intervals
//! - On WASM: `gloo-timers` futures and `std::time::Duration`

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};

pub use std::time::Duration;

/// Sleeps for the specified duration using the browser's `setTimeout`.
#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await
}

/// Converts a duration to whole milliseconds for timer APIs that take `u32`,
/// saturating instead of wrapping and never returning zero.
pub fn timer_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_millis_saturates_and_floors_at_one() {
        assert_eq!(timer_millis(Duration::from_millis(250)), 250);
        assert_eq!(timer_millis(Duration::ZERO), 1);
        assert_eq!(timer_millis(Duration::from_secs(u64::MAX / 1000)), u32::MAX);
    }
}
