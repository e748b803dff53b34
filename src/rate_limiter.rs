use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Admits at most one caller per `interval`.
///
/// Waiters queue on a fair mutex, so concurrent callers are released in
/// arrival order, one interval apart.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;

        if *next_slot > Instant::now() {
            sleep_until(*next_slot).await;
        }

        *next_slot = Instant::now() + self.interval;
    }
}
