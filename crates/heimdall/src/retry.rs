//! Bounded exponential-backoff retry for session checks.
//!
//! The policy knows nothing about session state; callers that want to
//! reflect progress pass an observer.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Attempts and delays for one retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u8,
    /// Delay after the first failure; doubles after each further failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
        }
    }
}

/// Progress of the current retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    /// Failed attempts so far.
    pub attempt: u8,
    pub max_attempts: u8,
    pub base_delay_ms: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u8, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A fresh context for a new cycle.
    pub fn context(&self) -> RetryContext {
        RetryContext {
            attempt: 0,
            max_attempts: self.attempts(),
            base_delay_ms: u32::try_from(self.base_delay.as_millis()).unwrap_or(u32::MAX),
        }
    }

    fn attempts(&self) -> u8 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u8) -> Duration {
        let exponent = u32::from(attempt.saturating_sub(1)).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Run `op` until it succeeds or the attempts are used up.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut(u8) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_with_observer(op, |_, _: &E, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_retry(failed_attempt, &error, delay)`
    /// before each wait. No wait follows the final attempt.
    pub async fn run_with_observer<T, E, F, Fut, O>(
        &self,
        mut op: F,
        mut on_retry: O,
    ) -> Result<T, E>
    where
        F: FnMut(u8) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(u8, &E, Duration),
    {
        let max_attempts = self.attempts();
        let mut attempt = 1u8;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => return Err(err),
                Err(err) => {
                    let delay = self.delay_for_attempt(attempt);
                    debug!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, backing off"
                    );
                    on_retry(attempt, &err, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Retry `op` with the given attempt count and base delay.
pub async fn with_retry<T, E, F, Fut>(op: F, max_attempts: u8, base_delay_ms: u32) -> Result<T, E>
where
    F: FnMut(u8) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_attempts, Duration::from_millis(u64::from(base_delay_ms)))
        .run(op)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4_000));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(255, Duration::from_secs(u64::MAX / 2));
        assert_eq!(policy.delay_for_attempt(200), Duration::MAX);
    }

    #[test]
    fn test_context() {
        let ctx = RetryPolicy::new(0, Duration::from_millis(250)).context();
        assert_eq!(ctx.attempt, 0);
        assert_eq!(ctx.max_attempts, 1);
        assert_eq!(ctx.base_delay_ms, 250);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_runs_once() {
        let mut calls = 0;
        let result: Result<(), &str> = RetryPolicy::new(0, Duration::from_millis(10))
            .run(|_| {
                calls += 1;
                async { Err("down") }
            })
            .await;
        assert_eq!(result, Err("down"));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_returns_first_success() {
        let result: Result<u8, &str> = with_retry(
            |attempt| async move { if attempt < 2 { Err("down") } else { Ok(attempt) } },
            3,
            100,
        )
        .await;
        assert_eq!(result, Ok(2));
    }
}
