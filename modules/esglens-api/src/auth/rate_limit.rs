use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Sliding-window rate limiter keyed by API key. State is ephemeral; a
/// restart resets every window.
pub struct RateLimiter {
    limit: u32,
    inner: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// `limit = rps + burst` requests per one-second window.
    pub fn new(rps: u32, burst: u32) -> Self {
        Self {
            limit: rps + burst,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject a request for `key` now. On admit, returns how many
    /// more requests fit in the current window.
    pub fn check(&self, key: &str) -> Result<u32, ()> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<u32, ()> {
        let mut inner = self.inner.lock().expect("rate limiter lock poisoned");
        let hits = inner.entry(key.to_string()).or_default();
        hits.retain(|t| now.duration_since(*t) < WINDOW);

        if hits.len() as u32 >= self.limit {
            return Err(());
        }
        hits.push(now);
        Ok(self.limit - hits.len() as u32)
    }
}
