//! Bounded retry with exponential backoff
//!
//! Only `Unavailable`-class faults are retried; validation, not-found, and
//! conflict errors surface immediately.

use crate::error::StoreResult;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry policy: exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial: Duration,
    /// Backoff multiplier per attempt
    pub factor: f64,
    /// Upper bound on any single delay
    pub cap: Duration,
    /// Jitter fraction applied symmetrically, e.g. 0.2 for +/-20%
    pub jitter: f64,
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(50),
            factor: 2.0,
            cap: Duration::from_secs(1),
            jitter: 0.2,
            max_attempts: 4,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before retry number `retry` (0-based), with jitter
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.initial.as_secs_f64() * self.factor.powi(retry as i32);
        let capped = base.min(self.cap.as_secs_f64());
        let spread = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
        Duration::from_secs_f64(capped * spread)
    }

    /// Run an operation, retrying retryable failures up to `max_attempts`
    pub async fn run<T, F, Fut>(&self, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "store operation failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial: Duration::from_millis(1),
            cap: Duration::from_millis(4),
            ..Default::default()
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..Default::default()
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(50));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        // 50ms * 2^6 = 3.2s, capped at 1s
        assert_eq!(policy.delay_for(6), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay_for(0).as_secs_f64();
            assert!(delay >= 0.050 * 0.8 - 1e-9);
            assert!(delay <= 0.050 * 1.2 + 1e-9);
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: StoreResult<u32> = fast_policy()
            .run(|| {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(StoreError::Unavailable("transient".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: StoreResult<u32> = fast_policy()
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StoreError::Unavailable("down".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: StoreResult<u32> = fast_policy()
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StoreError::NotFound("gone".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
