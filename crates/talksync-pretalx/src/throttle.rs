//! Outbound request spacing to respect the Pretalx rate limit.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive calls.
///
/// `Throttle::new(2)` spaces requests at least 500ms apart. A rate of zero
/// disables throttling.
pub(crate) struct Throttle {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub(crate) fn new(calls_per_second: u32) -> Self {
        let min_interval = if calls_per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(calls_per_second))
        };
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Waits until the next call is allowed, then records it.
    pub(crate) async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last_call.lock().await;
        let now = Instant::now();
        if let Some(prev) = *last {
            let next_allowed = prev + self.min_interval;
            if next_allowed > now {
                tokio::time::sleep(next_allowed - now).await;
            }
        }
        *last = Some(Instant::now());
    }
}
