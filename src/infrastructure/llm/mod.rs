//! Chat-completion infrastructure
//!
//! HTTP client, SSE stream parsing, retry policy and rate limiting for
//! OpenAI-compatible endpoints.

pub mod client;
pub mod rate_limiter;
pub mod retry;
pub mod streaming;
pub mod types;

pub use client::{CompletionClientConfig, HttpCompletionClient};
pub use rate_limiter::{RateLimiter, RatePermit};
pub use retry::{with_retry, RetryPolicy};
pub use streaming::SseStreamParser;
