//! Retry policy with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::models::RetryConfig;

/// Retry policy with exponential backoff
///
/// The delay before retry `n` (1-based) is
/// `initial_delay * backoff_factor^(n-1)`, capped at `max_delay`.
/// With the defaults that is 1s → 2s → 4s.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,

    pub initial_delay: Duration,

    pub backoff_factor: f64,

    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            backoff_factor,
            max_delay: Duration::from_millis(RetryConfig::default().max_delay_ms),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_factor: config.backoff_factor,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before the given retry (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Run `operation`, retrying every failure.
    ///
    /// Returns the first success or the last error once retries run out.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_when(operation, |_| true).await
    }

    /// Run `operation`, retrying only failures accepted by `should_retry`.
    ///
    /// A rejected error is returned immediately.
    pub async fn execute_when<F, Fut, T, E, P>(&self, mut operation: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut retry = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if retry > 0 {
                        debug!(retries = retry, "Operation succeeded after retrying");
                    }
                    return Ok(result);
                }
                Err(err) if retry < self.max_retries && should_retry(&err) => {
                    retry += 1;
                    let delay = self.delay_for_retry(retry);
                    warn!(
                        "Attempt {} failed: {}. Retrying in {:?}",
                        retry, err, delay
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    if retry > 0 {
                        warn!(attempts = retry + 1, error = %err, "Giving up");
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Run `operation` under a policy built from `max_retries`, `initial_delay_ms`
/// and `backoff_factor`.
pub async fn with_retry<F, Fut, T, E>(
    operation: F,
    max_retries: u32,
    initial_delay_ms: u64,
    backoff_factor: f64,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy::new(max_retries, initial_delay_ms, backoff_factor)
        .execute(operation)
        .await
}
