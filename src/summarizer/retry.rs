// file: src/summarizer/retry.rs
// description: exponential backoff with jitter around a single remote call
// reference: https://docs.rs/tokio/latest/tokio/time/fn.sleep.html

use crate::error::RemoteError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_RETRYABLE_STATUSES: &[u16] = &[408, 429, 500, 502, 503, 504];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub jitter_min: f64,
    pub jitter_max: f64,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 10_000,
            jitter_min: 0.8,
            jitter_max: 1.2,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay before retry number `attempt` (0-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let capped = millis.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    pub fn jittered(&self, base: Duration) -> Duration {
        let factor = if self.jitter_min < self.jitter_max {
            rand::rng().random_range(self.jitter_min..=self.jitter_max)
        } else {
            self.jitter_min
        };
        base.mul_f64(factor.max(0.0))
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries` retries have been spent.
///
/// The returned error carries the number of attempts actually made.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    request_id: &str,
    mut operation: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(request_id, "Succeeded after {} retries", attempt);
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => {
                debug!(request_id, kind = %err.kind, "Not retrying: {}", err.message);
                return Err(err.with_attempts(attempt + 1));
            }
            Err(err) if attempt >= policy.max_retries => {
                warn!(
                    request_id,
                    kind = %err.kind,
                    "Giving up after {} attempts: {}",
                    policy.max_retries + 1,
                    err.message
                );
                return Err(err.with_attempts(policy.max_retries + 1));
            }
            Err(err) => {
                let delay = policy.jittered(policy.base_delay(attempt));
                warn!(
                    request_id,
                    kind = %err.kind,
                    "Attempt {} failed, retrying in {:?}: {}",
                    attempt + 1,
                    delay,
                    err.message
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn test_base_delay_grows_and_caps() {
        let policy = RetryPolicy {
            initial_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 5000,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.base_delay(0), Duration::from_millis(1000));
        assert_eq!(policy.base_delay(1), Duration::from_millis(2000));
        assert_eq!(policy.base_delay(2), Duration::from_millis(4000));
        assert_eq!(policy.base_delay(3), Duration::from_millis(5000));
        assert_eq!(policy.base_delay(40), Duration::from_millis(5000));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = policy();
        let base = Duration::from_millis(1000);
        for _ in 0..200 {
            let delay = policy.jittered(base);
            assert!(delay >= Duration::from_millis(800), "{:?}", delay);
            assert!(delay <= Duration::from_millis(1200), "{:?}", delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_makes_one_attempt() {
        for kind in [RemoteErrorKind::ContentTooLarge, RemoteErrorKind::Unclassified] {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = calls.clone();

            let result: Result<(), RemoteError> = with_retry(&policy(), "req", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RemoteError::new(kind, "nope"))
                }
            })
            .await;

            let err = result.unwrap_err();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(err.kind, kind);
            assert_eq!(err.attempts, 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_failure_exhausts_retries_with_backoff() {
        let policy = policy();
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let recorder = stamps.clone();

        let result: Result<(), RemoteError> = with_retry(&policy, "req", || {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(Instant::now());
                Err(RemoteError::quota("quota exceeded").with_status(429))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Quota);
        assert_eq!(err.attempts, policy.max_retries + 1);

        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len() as u32, policy.max_retries + 1);

        let tolerance = Duration::from_millis(2);
        for (attempt, pair) in stamps.windows(2).enumerate() {
            let gap = pair[1] - pair[0];
            let expected = policy.base_delay(attempt as u32);
            let low = expected.mul_f64(0.8).saturating_sub(tolerance);
            let high = expected.mul_f64(1.2) + tolerance;
            assert!(
                gap >= low && gap <= high,
                "retry {} waited {:?}, expected within [{:?}, {:?}]",
                attempt,
                gap,
                low,
                high
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&policy(), "req", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(RemoteError::network("connection reset"))
                } else {
                    Ok("summary")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "summary");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), RemoteError> = with_retry(&policy, "req", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::network("down"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
