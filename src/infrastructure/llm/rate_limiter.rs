//! Concurrency and pacing limiter for completion requests.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error};

use crate::domain::errors::{AgentError, AgentResult};
use crate::domain::models::RateLimitConfig;

/// Bounds concurrent calls and spaces out queued ones.
///
/// At most `max_concurrent` operations run at once. A call that finds a
/// free slot starts immediately; a call that had to queue also waits until
/// `min_interval` has passed since the previous dispatch. Queued calls are
/// dispatched in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

/// A held slot. The slot is released when the permit is dropped, so a
/// streaming call keeps it for as long as its stream is alive.
#[derive(Debug)]
pub struct RatePermit {
    _permit: OwnedSemaphorePermit,
}

impl RateLimiter {
    /// A `max_concurrent` of zero is treated as one.
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_concurrent,
            Duration::from_millis(config.min_interval_ms),
        )
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of operations currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Stop handing out slots. Queued and future callers get an error;
    /// permits already held stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Run `operation` once a slot is free, returning its output.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> AgentResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire().await?;
        Ok(operation().await)
    }

    /// Wait for a slot and keep it until the returned permit is dropped.
    pub async fn acquire(&self) -> AgentResult<RatePermit> {
        if let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
            self.mark_dispatch(Instant::now());
            return Ok(RatePermit { _permit: permit });
        }

        debug!(
            in_flight = self.in_flight(),
            "Rate limiter saturated, queueing call"
        );

        let permit = self.semaphore.clone().acquire_owned().await.map_err(|e| {
            error!("Rate limiter semaphore unavailable: {}", e);
            AgentError::Configuration("rate limiter is closed".to_string())
        })?;

        // Recorded after the wait; a waiter dropped mid-sleep reserves nothing.
        while let Err(ready_at) = self.try_dispatch() {
            sleep_until(ready_at).await;
        }
        Ok(RatePermit { _permit: permit })
    }

    fn mark_dispatch(&self, at: Instant) {
        let mut last = self.last_dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        *last = Some(last.map_or(at, |prev| prev.max(at)));
    }

    /// Record a dispatch now if `min_interval` has passed since the previous
    /// one, otherwise return the earliest time it may happen.
    fn try_dispatch(&self) -> Result<(), Instant> {
        let now = Instant::now();
        let mut last = self.last_dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(prev) if prev + self.min_interval > now => Err(prev + self.min_interval),
            _ => {
                *last = Some(now);
                Ok(())
            }
        }
    }
}
