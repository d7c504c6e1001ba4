//! Paces outbound request dispatch.
//!
//! Everything that talks to a target goes through one of these: the scan
//! client spaces probes by a requests-per-second budget, the intruder by a
//! fixed inter-request interval. The first call through
//! [`RateLimiter::wait`] never sleeps, so a lone probe is unthrottled.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_dispatch: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// `rate` is requests per second; zero disables pacing.
    pub fn new(rate: u32) -> Self {
        let interval = if rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(rate))
        };
        Self::from_interval(interval)
    }

    /// Fixed minimum spacing between consecutive dispatches.
    pub fn from_interval(interval: Duration) -> Self {
        Self {
            interval,
            // backdated so the first wait returns immediately
            last_dispatch: Arc::new(Mutex::new(Instant::now() - interval)),
        }
    }

    pub async fn wait(&self) {
        let mut last = self.last_dispatch.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.interval {
            tokio::time::sleep(self.interval - elapsed).await;
        }

        *last = Instant::now();
    }
}
