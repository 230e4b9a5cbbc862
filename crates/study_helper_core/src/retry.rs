//! crates/study_helper_core/src/retry.rs
//!
//! A bounded retry helper with fixed delays, shared by the lookup client and
//! the generation gateway.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The failure is terminal; return it immediately.
    Stop,
    /// Retry after `n` base delays. `Retry(0)` retries immediately.
    Retry(u32),
}

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs `op` until it succeeds, `decide` returns [`RetryDecision::Stop`], or
/// the policy's attempts are exhausted. The last error is returned.
///
/// `op` receives the zero-based attempt number so callers can vary the
/// request between attempts.
pub async fn retry<T, E, F, Fut, D>(policy: &RetryPolicy, mut decide: D, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnMut(&E) -> RetryDecision,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(err);
                }
                match decide(&err) {
                    RetryDecision::Stop => return Err(err),
                    RetryDecision::Retry(weight) => {
                        let delay = policy.base_delay * weight;
                        debug!(attempt, ?delay, "retrying after failed attempt");
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry(
            &RetryPolicy::immediate(3),
            |_| RetryDecision::Retry(1),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("boom") }
            },
        )
        .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry(
            &RetryPolicy::immediate(3),
            |_| RetryDecision::Stop,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal") }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn passes_attempt_number_and_returns_first_success() {
        let result: Result<u32, &str> = retry(
            &RetryPolicy::immediate(5),
            |_| RetryDecision::Retry(0),
            |attempt| async move {
                if attempt < 2 {
                    Err("not yet")
                } else {
                    Ok(attempt)
                }
            },
        )
        .await;

        assert_eq!(result, Ok(2));
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
    }
}
