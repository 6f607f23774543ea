//! Error types for the Paygate client.
//!
//! The client separates failures into two families:
//!
//! - **Transport and marshalling errors** ([`PaygateError::Http`],
//!   [`PaygateError::Transport`], [`PaygateError::Decode`],
//!   [`PaygateError::Serialization`]): the request never produced a usable
//!   answer from the gateway.
//! - **Business errors** ([`PaygateError::Api`]): the gateway understood the
//!   request and rejected it. The wrapped [`ApiError`] carries the HTTP status,
//!   the gateway error code and any per-field errors.
//!
//! Local validation failures ([`PaygateError::InvalidInput`],
//! [`PaygateError::Config`]) are raised before any network traffic happens.
//!
//! # Examples
//!
//! ```
//! use paygate::error::{PaygateError, Result};
//!
//! fn require_id(id: &str) -> Result<&str> {
//!     if id.is_empty() {
//!         return Err(PaygateError::InvalidInput("id must not be empty".to_owned()));
//!     }
//!     Ok(id)
//! }
//!
//! assert!(require_id("").is_err());
//! ```

use std::{fmt, time::Duration};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, PaygateError>;

/// Errors returned by the Paygate client.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum PaygateError {
    /// HTTP request failed at the network level.
    ///
    /// Wraps [`reqwest::Error`]: connection refused, DNS failure, TLS errors
    /// and timeouts.
    ///
    /// # Recovery
    ///
    /// Timeouts and connection failures are retried automatically according
    /// to the client's [`RetryPolicy`](crate::reliability::RetryPolicy).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request rejected locally before it was sent.
    ///
    /// Raised for non-HTTPS base URLs, path traversal sequences and header
    /// values containing control characters.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway reported a business failure.
    #[error(transparent)]
    Api(ApiError),

    /// The response body could not be decoded into the expected type.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be encoded.
    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    /// An argument failed local validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::error::PaygateError;
    ///
    /// let err = PaygateError::InvalidInput("limit must be between 1 and 100".to_owned());
    /// assert!(err.to_string().contains("Invalid input"));
    /// ```
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration is invalid or credentials are missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A webhook payload failed signature verification.
    #[error("Webhook signature verification failed: {0}")]
    WebhookSignature(String),
}

impl PaygateError {
    /// Returns true when the request never reached a decodable gateway answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Transport(_) | Self::Decode(_) | Self::Serialization(_)
        )
    }

    /// Returns the business error, if the gateway reported one.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the gateway request id, if the gateway assigned one.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.api_error().and_then(|err| err.request_id.as_deref())
    }
}

impl From<ApiError> for PaygateError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

/// A single field-level validation error reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    /// Offending request field, when the gateway names one.
    #[serde(default)]
    pub field: Option<String>,
    /// Machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable description, empty when the gateway sends none.
    #[serde(default)]
    pub message: String,
}

/// Business failure reported by the gateway.
///
/// Built from the failure envelope:
///
/// ```json
/// {"object": "error", "status": "failure", "code": "invalid_card",
///  "message": "card was declined", "errors": [], "request_id": "req_123"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code of the response.
    pub status: u16,
    /// Machine-readable error code (e.g. `invalid_card`, `not_found`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Field-level errors, possibly empty.
    pub errors: Vec<FieldError>,
    /// Gateway request id for support requests.
    pub request_id: Option<String>,
    /// Delay requested by the gateway through `Retry-After`.
    pub retry_after: Option<Duration>,
}

impl ApiError {
    /// Returns true if a JSON body is a failure envelope.
    ///
    /// The gateway marks failures with `"object": "error"` and some endpoints
    /// report declines as `"status": "failure"` with a 2xx status.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::error::ApiError;
    /// use serde_json::json;
    ///
    /// assert!(ApiError::is_failure(&json!({"object": "error", "message": "nope"})));
    /// assert!(ApiError::is_failure(&json!({"status": "failure", "errors": []})));
    /// assert!(!ApiError::is_failure(&json!({"object": "charge", "status": "successful"})));
    /// ```
    #[must_use]
    pub fn is_failure(body: &Value) -> bool {
        let Some(obj) = body.as_object() else {
            return false;
        };
        obj.get("object").and_then(Value::as_str) == Some("error")
            || obj.get("status").and_then(Value::as_str) == Some("failure")
    }

    /// Builds an error from a failure body.
    ///
    /// Missing fields fall back to values derived from the HTTP status so
    /// that every error has a code and a message. Non-envelope bodies (HTML
    /// error pages, plain text) end up in `message`, truncated.
    #[must_use]
    pub fn from_body(status: u16, body: &Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_owned);
        let code = field("code");
        let request_id = field("request_id");
        let errors: Vec<FieldError> = body
            .get("errors")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| FieldError::deserialize(item).ok())
                    .collect()
            })
            .unwrap_or_default();

        let message = field("message")
            .or_else(|| body.as_str().map(|text| truncate(text, 256)))
            .or_else(|| errors.iter().find(|e| !e.message.is_empty()).map(|e| e.message.clone()))
            .unwrap_or_else(|| default_message(status).to_owned());

        Self {
            status,
            code: code.unwrap_or_else(|| default_code(status).to_owned()),
            message,
            errors,
            request_id,
            retry_after: None,
        }
    }

    /// Sets the request id when the body did not carry one.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        if self.request_id.is_none() {
            self.request_id = request_id;
        }
        self
    }

    /// Sets the `Retry-After` delay.
    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Returns true for `429 Too Many Requests`.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Returns true for 5xx statuses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Returns true for 401 and 403.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {} ({}): {}", self.status, self.code, self.message)?;
        if let Some(id) = &self.request_id {
            write!(f, " [request {id}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

const fn default_code(status: u16) -> &'static str {
    match status {
        400 => "bad_request",
        401 => "authentication_failure",
        403 => "forbidden",
        404 => "not_found",
        409 => "conflict",
        422 => "unprocessable_entity",
        429 => "rate_limited",
        500..=599 => "server_error",
        _ => "failure",
    }
}

const fn default_message(status: u16) -> &'static str {
    match status {
        401 => "authentication failed",
        404 => "resource not found",
        429 => "too many requests",
        500..=599 => "gateway server error",
        _ => "request failed",
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}
