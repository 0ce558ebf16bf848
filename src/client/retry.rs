use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ClientError, ClientResult};

/// Delay before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the given failed attempt (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

type RetryPredicate = Arc<dyn Fn(&ClientError) -> bool + Send + Sync>;

/// How a client retries a failed call
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Backoff,
    retryable: RetryPredicate,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
            retryable: Arc::new(ClientError::is_transient),
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential {
                base,
                max: Duration::from_secs(10),
            },
            retryable: Arc::new(ClientError::is_transient),
        }
    }

    /// Replaces the predicate deciding which errors are worth another attempt
    pub fn with_retryable(
        mut self,
        retryable: impl Fn(&ClientError) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.retryable = Arc::new(retryable);
        self
    }

    pub fn is_retryable(&self, err: &ClientError) -> bool {
        (self.retryable)(err)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && self.is_retryable(&err) => {
                    let delay = self.backoff.delay(attempt);
                    tracing::debug!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "Retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
