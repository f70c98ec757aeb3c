use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Retry policy: capped exponential backoff with full jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base: Duration::from_secs(2),
            cap: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (1-based): `min(cap, base * 2^attempt) + jitter`.
    fn delay(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(2u32.saturating_pow(attempt)).min(self.cap);
        let jitter_ms = rand::rng().random_range(0..1000);
        exp + Duration::from_millis(jitter_ms)
    }
}

/// Run `op` up to `policy.attempts` times, sleeping between attempts.
/// The last error is returned when all attempts are exhausted.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= policy.attempts {
                    return Err(e);
                }
                let delay = policy.delay(attempt);
                warn!(
                    label,
                    attempt,
                    max_attempts = policy.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            base: Duration::from_millis(1),
            cap: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_retry(fast_policy(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, String> = with_retry(fast_policy(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = with_retry(fast_policy(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;
        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy {
            attempts: 10,
            base: Duration::from_secs(2),
            cap: Duration::from_secs(30),
        };
        // 2 * 2^20 would overflow the cap by far; jitter adds < 1s.
        assert!(policy.delay(20) <= Duration::from_secs(31));
    }
}
