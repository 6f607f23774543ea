//! Reliability patterns for gateway calls.
//!
//! Provides exponential backoff retries for transient failures such as
//! connection resets, gateway 5xx responses and rate limiting.

mod retry;

pub use retry::{RetryPolicy, Retryable, retry_with_backoff};
