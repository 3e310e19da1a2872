use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Rolling-window limiter on transfer initiations per account. Blunts abuse
/// and error amplification; hitting the cap is not a data-integrity error,
/// callers translate `false` into `RateLimited` and may retry after backoff.
///
/// Threshold and window come from configuration (`TRANSFER_RATE_LIMIT`,
/// `TRANSFER_RATE_WINDOW_SECS`).
pub struct TransferRateLimiter {
    max_per_window: u32,
    window: Duration,
    hits: Mutex<HashMap<Uuid, VecDeque<Instant>>>,
}

impl TransferRateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn check_and_record(&self, account: Uuid) -> bool {
        self.check_and_record_at(account, Instant::now())
    }

    fn check_and_record_at(&self, account: Uuid, now: Instant) -> bool {
        let mut hits = self.lock();
        let window = hits.entry(account).or_default();

        while window
            .front()
            .is_some_and(|hit| now.duration_since(*hit) >= self.window)
        {
            window.pop_front();
        }

        if window.len() as u32 >= self.max_per_window {
            return false;
        }

        window.push_back(now);
        true
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, VecDeque<Instant>>> {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
