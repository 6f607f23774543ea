//! Exponential backoff retry logic for transient failures.
//!
//! This module provides retry functionality with exponential backoff
//! for handling transient network errors and temporary gateway unavailability.

use std::{fmt, time::Duration};

use crate::error::PaygateError;

/// Configuration for retry behavior.
///
/// The delay between retries increases exponentially up to a maximum value.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use paygate::reliability::RetryPolicy;
///
/// // Default policy: 3 attempts, 200ms initial delay, 5s max delay
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
///
/// // No retries at all
/// let single = RetryPolicy::no_retry();
/// assert_eq!(single.max_attempts, 1);
///
/// let aggressive = RetryPolicy {
///     max_attempts: 5,
///     initial_delay: Duration::from_millis(50),
///     max_delay: Duration::from_secs(10),
///     backoff_multiplier: 2.0,
/// };
/// # let _ = aggressive;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one (default: 3)
    pub max_attempts: u32,
    /// Initial delay between retries (default: 200ms)
    pub initial_delay: Duration,
    /// Maximum delay between retries (default: 5s)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy with custom maximum attempts.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::reliability::RetryPolicy;
    ///
    /// let policy = RetryPolicy::with_max_attempts(5);
    /// assert_eq!(policy.max_attempts, 5);
    /// ```
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts, ..Self::default() }
    }

    /// A policy that performs exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::with_max_attempts(1)
    }

    /// Calculates delay for a specific attempt.
    ///
    /// Uses exponential backoff: delay = `initial_delay` * (multiplier ^ attempt),
    /// capped at `max_delay`.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        #[allow(clippy::cast_precision_loss, reason = "acceptable for duration calculations")]
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "capped against max_delay below; float to int casts saturate"
        )]
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Delay before the retry following `attempt`, honouring a server hint.
    ///
    /// The server hint wins when it is longer than the backoff, but never
    /// exceeds `max_delay`.
    fn delay_with_hint(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self.delay_for_attempt(attempt);
        retry_after.map_or(backoff, |hint| hint.max(backoff).min(self.max_delay))
    }
}

/// Classifies errors for [`retry_with_backoff`].
pub trait Retryable {
    /// Returns true if the failed operation may succeed when repeated.
    fn is_retryable(&self) -> bool;

    /// Server-requested wait before the next attempt, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Retryability of gateway errors.
///
/// # Retryable Errors
///
/// - Connection failures and timeouts
/// - Server errors (5xx status codes)
/// - Rate limiting (429), honouring `Retry-After`
///
/// # Non-Retryable Errors
///
/// - Authentication and permission failures (401, 403)
/// - Any other 4xx business error
/// - Local validation, configuration and serialization errors
/// - Responses that could not be decoded
/// - Webhook signature failures
impl Retryable for PaygateError {
    #[allow(clippy::match_same_arms, reason = "separate arms for clarity")]
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::Api(api) => api.is_rate_limited() || api.is_server_error(),
            Self::Transport(_) | Self::InvalidInput(_) | Self::Config(_) => false,
            Self::Decode(_) | Self::Serialization(_) => false,
            Self::WebhookSignature(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        self.api_error().and_then(|api| api.retry_after)
    }
}

/// Executes operation with exponential backoff retry.
///
/// Retries the operation up to `max_attempts` times, with exponentially
/// increasing delays between attempts. Errors that are not
/// [`Retryable::is_retryable`] are returned immediately. A policy with
/// `max_attempts == 0` still performs one attempt.
///
/// # Examples
///
/// ```
/// use std::sync::{
///     Arc,
///     atomic::{AtomicU32, Ordering},
/// };
///
/// use paygate::{
///     error::{ApiError, PaygateError},
///     reliability::{RetryPolicy, retry_with_backoff},
/// };
///
/// # async fn example() -> paygate::error::Result<String> {
/// let policy = RetryPolicy::default();
/// let attempt = Arc::new(AtomicU32::new(0));
///
/// let result = retry_with_backoff(&policy, || {
///     let attempt = Arc::clone(&attempt);
///     async move {
///         if attempt.fetch_add(1, Ordering::Relaxed) < 2 {
///             Err(PaygateError::Api(ApiError::from_body(503, &serde_json::Value::Null)))
///         } else {
///             Ok("success".to_owned())
///         }
///     }
/// })
/// .await?;
///
/// assert_eq!(result, "success");
/// # Ok(result)
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error encountered if all attempts fail, or the first
/// non-retryable error.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempt = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                if !error.is_retryable() || attempt + 1 >= max_attempts {
                    return Err(error);
                }

                let delay = policy.delay_with_hint(attempt, error.retry_after());
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
