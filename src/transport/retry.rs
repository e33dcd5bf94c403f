//! Bounded retry with exponential backoff
//!
//! The policy is independent of HTTP: an operation reports each attempt as
//! an [`Attempt`], and [`RetryPolicy::execute`] decides whether to sleep and
//! try again. Sleeping goes through a [`Sleeper`] so tests can observe the
//! schedule without waiting.

use crate::core::{ClientConfig, ClientError, Result};
use std::time::Duration;

/// Blocks the calling thread between attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for Box<S> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Sleeper backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Outcome of a single attempt
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    /// Transient failure; `retry_after` overrides the computed backoff
    Retry {
        error: ClientError,
        retry_after: Option<Duration>,
    },
    /// Permanent failure, returned without further attempts
    Fail(ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_retries,
            min_wait,
            max_wait,
        }
    }

    /// Single attempt, no retries
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_retry, config.retry_min_wait, config.retry_max_wait)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after the `attempt`-th failed attempt (1-based):
    /// `min_wait * 2^(attempt-1)`, capped at `max_wait`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.min_wait
            .checked_mul(factor)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn execute<T, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Attempt<T>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fail(error) => return Err(error),
                Attempt::Retry { error, retry_after } => {
                    if attempt >= max_attempts {
                        if max_attempts == 1 {
                            return Err(error);
                        }
                        return Err(ClientError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(error),
                        });
                    }

                    let wait = retry_after
                        .map(|after| after.min(self.max_wait))
                        .unwrap_or_else(|| self.backoff(attempt));
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %error,
                        "PROMTAIL | Push attempt failed, retrying"
                    );
                    sleeper.sleep(wait);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
