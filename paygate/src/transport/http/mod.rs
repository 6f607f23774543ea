//! HTTP transport implementation.
//!
//! This module provides HTTP/1.1 and HTTP/2 transport using reqwest.

use std::{sync::LazyLock, time::Duration};

use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    auth::ApiKey,
    error::{PaygateError, Result},
    transport::{Method, RequestContext, Transport, TransportResponse, sealed},
};

/// Default HTTP client with connection pooling enabled.
///
/// Shared by every default transport so that connection pools are reused.
#[allow(clippy::expect_used, reason = "client builder only fails on TLS backend init")]
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(10)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create default HTTP client")
});

/// Validates URL for security constraints.
///
/// Ensures the URL uses HTTPS and does not point to a loopback host, unless
/// `allow_insecure` is set (local mocks, sandboxes behind a proxy).
fn validate_url(url: &Url, allow_insecure: bool) -> Result<()> {
    if allow_insecure {
        return match url.scheme() {
            "https" | "http" => Ok(()),
            other => Err(PaygateError::Transport(format!("unsupported URL scheme: {other}"))),
        };
    }

    if url.scheme() != "https" {
        return Err(PaygateError::Transport("Only HTTPS URLs are allowed".to_owned()));
    }

    if let Some(host) = url.host_str()
        && is_loopback(host)
    {
        return Err(PaygateError::Transport("Localhost URLs are not allowed".to_owned()));
    }

    Ok(())
}

pub(crate) fn is_loopback(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "localhost" || host == "::1" || host == "[::1]" || host.starts_with("127.")
}

/// Sanitizes path to prevent path traversal attacks.
fn sanitize_path(path: &str) -> Result<&str> {
    if path.contains("..") || path.contains("//") {
        return Err(PaygateError::Transport(
            "Invalid path: traversal sequences not allowed".to_owned(),
        ));
    }
    if !path.is_empty() && !path.starts_with('/') {
        return Err(PaygateError::Transport("Path must start with '/'".to_owned()));
    }
    Ok(path)
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.contains(['\r', '\n', '\0']) {
        return Err(PaygateError::Transport(
            "Invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(PaygateError::Transport(
            "Invalid header value: control characters not allowed".to_owned(),
        ));
    }
    Ok(())
}

/// Builds the full request URL from base URL, path and query pairs.
fn build_url(ctx: &RequestContext<'_>, allow_insecure: bool) -> Result<Url> {
    let base = Url::parse(ctx.base_url)
        .map_err(|e| PaygateError::Transport(format!("invalid base_url: {e}")))?;
    validate_url(&base, allow_insecure)?;
    if base.host_str().is_none() {
        return Err(PaygateError::Transport(format!("URL missing host: {}", ctx.base_url)));
    }

    let path = sanitize_path(ctx.path)?;
    let mut url = Url::parse(&format!("{}{path}", ctx.base_url.trim_end_matches('/')))
        .map_err(|e| PaygateError::Transport(format!("invalid request path: {e}")))?;

    if !ctx.query.is_empty() {
        url.query_pairs_mut().extend_pairs(ctx.query);
    }

    Ok(url)
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports connection pooling, keep-alive and HTTP/2 multiplexing.
///
/// # Examples
///
/// ```
/// use paygate::transport::{HttpConfig, HttpTransport, HttpVersion, Transport};
///
/// let config = HttpConfig { http_version: HttpVersion::Http1, ..Default::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// assert_eq!(transport.protocol_name(), "http/1.1");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
    allow_insecure: bool,
}

impl sealed::private::Sealed for HttpTransport {}

impl HttpTransport {
    /// Creates a new HTTP transport with default settings.
    ///
    /// Uses a shared client for connection pooling.
    ///
    /// # Errors
    ///
    /// This method is infallible but returns `Result` for API consistency.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: DEFAULT_HTTP_CLIENT.clone(),
            http_version: HttpVersion::Auto,
            allow_insecure: false,
        })
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is out of bounds or the HTTP client
    /// cannot be built.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build().map_err(PaygateError::Http)?;

        Ok(Self { client, http_version: config.http_version, allow_insecure: false })
    }

    /// Allows plain HTTP and loopback hosts.
    ///
    /// Intended for local mock servers; never enable against the live gateway.
    #[must_use]
    pub const fn allow_insecure(mut self, allow: bool) -> Self {
        self.allow_insecure = allow;
        self
    }

    #[instrument(
        skip(self, key, ctx, body),
        fields(method = %method, path = ctx.path, protocol = self.protocol_name())
    )]
    async fn execute_request(
        &self,
        key: &ApiKey,
        ctx: RequestContext<'_>,
        method: Method,
        body: Option<&[u8]>,
    ) -> Result<TransportResponse> {
        let url = build_url(&ctx, self.allow_insecure)?;

        for (name, value) in &ctx.headers {
            validate_header(name, value)?;
        }

        let mut request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        };

        request = request.header("Authorization", key.authorization(ctx.auth_scheme));

        if let Some(content_type) = ctx.content_type {
            request = request.header("Content-Type", content_type);
        }

        for (name, value) in ctx.headers {
            request = request.header(name, value);
        }

        if let Some(bytes) = body
            && !bytes.is_empty()
        {
            request = request.body(bytes.to_vec());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_ascii_lowercase(), v.to_str().unwrap_or("").to_owned()))
            .collect();

        let response_body = response.bytes().await.map_err(PaygateError::Http)?.to_vec();

        tracing::trace!(status, bytes = response_body.len(), "response received");

        Ok(TransportResponse { status, body: response_body, headers })
    }
}

impl Transport for HttpTransport {
    async fn get<'a>(&'a self, key: &'a ApiKey, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.execute_request(key, ctx, Method::Get, None).await
    }

    async fn post<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.execute_request(key, ctx, Method::Post, Some(body)).await
    }

    async fn patch<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.execute_request(key, ctx, Method::Patch, Some(body)).await
    }

    async fn delete<'a>(
        &'a self,
        key: &'a ApiKey,
        ctx: RequestContext<'a>,
    ) -> Result<TransportResponse> {
        self.execute_request(key, ctx, Method::Delete, None).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScheme;

    fn ctx<'a>(base_url: &'a str, path: &'a str) -> RequestContext<'a> {
        RequestContext {
            base_url,
            path,
            query: &[],
            headers: vec![],
            content_type: None,
            auth_scheme: AuthScheme::Basic,
        }
    }

    fn key() -> ApiKey {
        ApiKey::new("skey_test_123").unwrap()
    }

    #[test]
    fn test_http_transport_new() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.protocol_name(), "http");
        assert!(!transport.allow_insecure);
    }

    #[test]
    fn test_http_transport_protocol_name() {
        let config_http1 = HttpConfig { http_version: HttpVersion::Http1, ..Default::default() };
        let transport_http1 = HttpTransport::with_config(&config_http1).unwrap();
        assert_eq!(transport_http1.protocol_name(), "http/1.1");

        let config_http2 = HttpConfig { http_version: HttpVersion::Http2, ..Default::default() };
        let transport_http2 = HttpTransport::with_config(&config_http2).unwrap();
        assert_eq!(transport_http2.protocol_name(), "http/2");
    }

    #[test]
    fn test_http_transport_http2_from_toml() {
        let config: HttpConfig = toml::from_str(r#"http_version = "http2""#).unwrap();
        assert_eq!(config.http_version, HttpVersion::Http2);
        let transport = HttpTransport::with_config(&config).unwrap();
        assert_eq!(transport.protocol_name(), "http/2");
    }

    #[test]
    fn test_http_transport_with_invalid_config() {
        let config = HttpConfig { timeout_secs: 0, ..Default::default() };
        assert!(matches!(HttpTransport::with_config(&config), Err(PaygateError::Config(_))));
    }

    #[tokio::test]
    async fn test_http_transport_get_invalid_url() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.get(&key(), ctx("not-a-url", "/v1/balance")).await;
        assert!(matches!(result, Err(PaygateError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_http_url() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.get(&key(), ctx("http://api.paygate.dev", "/v1/balance")).await;
        assert!(matches!(result, Err(PaygateError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_localhost() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.get(&key(), ctx("https://localhost", "/v1/balance")).await;
        assert!(matches!(result, Err(PaygateError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_path_traversal() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.get(&key(), ctx("https://api.paygate.dev", "/../etc/passwd")).await;
        assert!(matches!(result, Err(PaygateError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_crlf_header() {
        let transport = HttpTransport::new().unwrap();
        let mut context = ctx("https://api.paygate.dev", "/v1/balance");
        context.headers = vec![("X-Evil\r\n", "value")];
        let result = transport.get(&key(), context).await;
        assert!(matches!(result, Err(PaygateError::Transport(_))));
    }

    #[test]
    fn test_validate_url_https_required() {
        let https_url = Url::parse("https://example.com").unwrap();
        assert!(validate_url(&https_url, false).is_ok());

        let http_url = Url::parse("http://example.com").unwrap();
        assert!(matches!(validate_url(&http_url, false), Err(PaygateError::Transport(_))));
        assert!(validate_url(&http_url, true).is_ok());
    }

    #[test]
    fn test_validate_url_insecure_still_rejects_other_schemes() {
        let file_url = Url::parse("file:///etc/passwd").unwrap();
        assert!(validate_url(&file_url, true).is_err());
    }

    #[test]
    fn test_validate_url_localhost_blocked() {
        for url in ["https://localhost/api", "https://127.0.0.1/api", "https://[::1]/api"] {
            let url = Url::parse(url).unwrap();
            assert!(validate_url(&url, false).is_err(), "accepted {url}");
            assert!(validate_url(&url, true).is_ok());
        }
    }

    #[test]
    fn test_sanitize_path() {
        assert!(sanitize_path("/v1/charges").is_ok());
        assert!(sanitize_path("").is_ok());
        assert!(sanitize_path("/v1/../config").is_err());
        assert!(sanitize_path("/v1//charges").is_err());
        assert!(sanitize_path("v1/charges").is_err());
    }

    #[test]
    fn test_validate_header_crlf_injection_blocked() {
        assert!(validate_header("Idempotency-Key", "abc").is_ok());
        assert!(validate_header("X-Evil\r\n", "value").is_err());
        assert!(validate_header("X-Custom", "value\r\nEvil-Header: injected").is_err());
        assert!(validate_header("X-Custom", "value\0evil").is_err());
    }

    #[test]
    fn test_build_url_with_query() {
        let query = vec![
            ("limit".to_owned(), "10".to_owned()),
            ("from".to_owned(), "2024-01-01T00:00:00+00:00".to_owned()),
        ];
        let mut context = ctx("https://api.paygate.dev/", "/v1/charges");
        context.query = &query;

        let url = build_url(&context, false).unwrap();
        assert_eq!(url.path(), "/v1/charges");
        assert_eq!(
            url.query(),
            Some("limit=10&from=2024-01-01T00%3A00%3A00%2B00%3A00")
        );
    }

    #[test]
    fn test_build_url_without_query() {
        let url = build_url(&ctx("https://api.paygate.dev", "/v1/account"), false).unwrap();
        assert_eq!(url.as_str(), "https://api.paygate.dev/v1/account");
        assert!(url.query().is_none());
    }
}
