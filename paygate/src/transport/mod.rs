//! Transport abstraction layer.
//!
//! This module provides a sealed `Transport` trait that moves bytes between
//! the client and the gateway. The transport attaches authentication and
//! validates requests; it does not interpret response bodies. Mapping status
//! codes and failure envelopes into errors is the job of the
//! [`Client`](crate::Client).
//!
//! # Examples
//!
//! ```rust,no_run
//! use paygate::{
//!     auth::{ApiKey, AuthScheme},
//!     transport::{HttpTransport, RequestContext, Transport},
//! };
//!
//! # async fn example() -> paygate::error::Result<()> {
//! let transport = HttpTransport::new()?;
//! let key = ApiKey::new("skey_test_123")?;
//!
//! let ctx = RequestContext {
//!     base_url: "https://api.paygate.dev",
//!     path: "/v1/balance",
//!     query: &[],
//!     headers: vec![("Accept", "application/json")],
//!     content_type: None,
//!     auth_scheme: AuthScheme::Basic,
//! };
//!
//! let response = transport.get(&key, ctx).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::fmt;

use crate::{
    auth::{ApiKey, AuthScheme},
    error::Result,
};

pub mod config;
pub mod http;
#[cfg(test)]
pub(crate) mod mock;
mod sealed;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// HTTP method of a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request context for transport operations.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Gateway base URL (e.g. <https://api.paygate.dev>).
    pub base_url: &'a str,
    /// Request path including the API prefix (e.g. "/v1/charges").
    pub path: &'a str,
    /// Query string pairs, encoded by the transport.
    pub query: &'a [(String, String)],
    /// Additional HTTP headers to include.
    pub headers: Vec<(&'a str, &'a str)>,
    /// Content-Type header value (if applicable).
    pub content_type: Option<&'a str>,
    /// How the API key is presented.
    pub auth_scheme: AuthScheme,
}

/// Response from transport operations.
///
/// Non-2xx responses are returned as values, not errors.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Response headers, names lowercased.
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport protocol abstraction.
///
/// This trait is sealed: only implementations within this crate exist, so
/// every transport enforces the same security checks.
///
/// # Security
///
/// All transport implementations:
/// - Attach the `Authorization` header derived from the [`ApiKey`]
/// - Reject non-HTTPS and loopback URLs unless explicitly allowed
/// - Reject path traversal sequences and CRLF in headers
pub trait Transport: sealed::private::Sealed + Send + Sync {
    /// Executes a GET request.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails or the HTTP exchange fails.
    fn get<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a POST request with a body.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails or the HTTP exchange fails.
    fn post<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a PATCH request with a body.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails or the HTTP exchange fails.
    fn patch<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails or the HTTP exchange fails.
    fn delete<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}
