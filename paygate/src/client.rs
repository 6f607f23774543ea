//! Gateway client and request pipeline.
//!
//! Every service call goes through the same steps:
//!
//! 1. resolve the path under the API prefix and pick the key
//! 2. serialize the request body
//! 3. send it through the [`Transport`], retrying transient failures
//! 4. map non-2xx statuses and failure envelopes into [`ApiError`]
//! 5. deserialize the response into the resource type
//!
//! # Examples
//!
//! ```rust,no_run
//! use paygate::{Client, auth::Credentials};
//!
//! # async fn example() -> paygate::error::Result<()> {
//! let client = Client::builder()
//!     .credentials(Credentials::new("skey_test_123")?)
//!     .api_version("2024-06-01")
//!     .build()?;
//!
//! let balance = client.balance().retrieve().await?;
//! println!("available: {}", balance.available);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::{ApiKey, AuthScheme, Credentials, KeyKind},
    config::{self, ClientConfig, DEFAULT_API_PREFIX, DEFAULT_BASE_URL},
    error::{ApiError, PaygateError, Result},
    reliability::{RetryPolicy, retry_with_backoff},
    resources::{
        AccountService, BalanceService, Cards, Charges, Customers, Events, Plans, Recipients, Refunds,
        Subscriptions, Tokens, Transfers, WebhookEndpoints,
    },
    transport::{HttpConfig, HttpTransport, Method, RequestContext, Transport},
    types::{ListParams, Pageable},
};

/// Value of the `User-Agent` header.
pub const USER_AGENT: &str = concat!("paygate-rust/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";
const REQUEST_ID_HEADER: &str = "paygate-request-id";

/// Client for the Paygate API.
///
/// Cheap to share by reference; service handles such as
/// [`charges`](Self::charges) borrow it.
#[derive(Debug)]
pub struct Client<T: Transport = HttpTransport> {
    transport: T,
    credentials: Credentials,
    base_url: String,
    api_prefix: String,
    api_version: Option<String>,
    auth_scheme: AuthScheme,
    retry_policy: RetryPolicy,
}

impl Client {
    /// Creates a client for the production gateway with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP transport cannot be created.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder().credentials(credentials).build()
    }

    /// Returns a builder for a customised client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Creates a client from configuration, reading keys from the configured
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the configuration is invalid or
    /// the secret key is missing.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let credentials = Credentials::from_env(
            &config.credentials.secret_key_env,
            &config.credentials.public_key_env,
        )?;

        let mut builder = Self::builder()
            .credentials(credentials)
            .base_url(&config.base_url)
            .api_prefix(&config.api_prefix)
            .auth_scheme(config.auth_scheme)
            .retry_policy(config.retry.policy())
            .http_config(config.http.clone())
            .allow_insecure_http(config.allow_insecure_http);
        if let Some(version) = &config.api_version {
            builder = builder.api_version(version);
        }
        builder.build()
    }

    /// Creates a default client with keys from `PAYGATE_SECRET_KEY` and
    /// `PAYGATE_PUBLIC_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the secret key is missing or invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ClientConfig::default())
    }
}

impl<T: Transport> Client<T> {
    /// Returns true when the client uses sandbox keys.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.credentials.is_test_mode()
    }

    /// Gateway base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Charges service.
    #[must_use]
    pub const fn charges(&self) -> Charges<'_, T> {
        Charges::new(self)
    }

    /// Refunds service.
    #[must_use]
    pub const fn refunds(&self) -> Refunds<'_, T> {
        Refunds::new(self)
    }

    /// Customers service.
    #[must_use]
    pub const fn customers(&self) -> Customers<'_, T> {
        Customers::new(self)
    }

    /// Customer cards service.
    #[must_use]
    pub const fn cards(&self) -> Cards<'_, T> {
        Cards::new(self)
    }

    /// Card tokens service. Requires a public key.
    #[must_use]
    pub const fn tokens(&self) -> Tokens<'_, T> {
        Tokens::new(self)
    }

    /// Plans service.
    #[must_use]
    pub const fn plans(&self) -> Plans<'_, T> {
        Plans::new(self)
    }

    /// Subscriptions service.
    #[must_use]
    pub const fn subscriptions(&self) -> Subscriptions<'_, T> {
        Subscriptions::new(self)
    }

    /// Transfers service.
    #[must_use]
    pub const fn transfers(&self) -> Transfers<'_, T> {
        Transfers::new(self)
    }

    /// Transfer recipients service.
    #[must_use]
    pub const fn recipients(&self) -> Recipients<'_, T> {
        Recipients::new(self)
    }

    /// Events service.
    #[must_use]
    pub const fn events(&self) -> Events<'_, T> {
        Events::new(self)
    }

    /// Webhook endpoints service.
    #[must_use]
    pub const fn webhook_endpoints(&self) -> WebhookEndpoints<'_, T> {
        WebhookEndpoints::new(self)
    }

    /// Balance service.
    #[must_use]
    pub const fn balance(&self) -> BalanceService<'_, T> {
        BalanceService::new(self)
    }

    /// Account service.
    #[must_use]
    pub const fn account(&self) -> AccountService<'_, T> {
        AccountService::new(self)
    }

    #[cfg(test)]
    pub(crate) const fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.execute(Call::new(Method::Get, path)).await
    }

    pub(crate) async fn list<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<Pageable<R>> {
        params.validate()?;
        let query = params.to_query();
        self.execute(Call { query: &query, ..Call::new(Method::Get, path) }).await
    }

    pub(crate) async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode(body)?;
        self.execute(Call { body: Some(&body), idempotency_key, ..Call::new(Method::Post, path) })
            .await
    }

    pub(crate) async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode(body)?;
        self.execute(Call { body: Some(&body), ..Call::new(Method::Patch, path) }).await
    }

    pub(crate) async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.execute(Call::new(Method::Delete, path)).await
    }

    /// GET and POST authenticated with the public key.
    pub(crate) async fn get_public<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.execute(Call { key: KeyKind::Public, ..Call::new(Method::Get, path) }).await
    }

    pub(crate) async fn post_public<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode(body)?;
        self.execute(Call {
            body: Some(&body),
            key: KeyKind::Public,
            ..Call::new(Method::Post, path)
        })
        .await
    }

    async fn execute<R: DeserializeOwned>(&self, call: Call<'_>) -> Result<R> {
        let key = match call.key {
            KeyKind::Secret => self.credentials.secret(),
            KeyKind::Public => self.credentials.public()?,
        };
        if let Some(key) = call.idempotency_key
            && key.trim().is_empty()
        {
            return Err(PaygateError::InvalidInput("idempotency key must not be empty".to_owned()));
        }
        let path = format!("{}{}", self.api_prefix, call.path);

        // One key per logical call, shared by every retry.
        let idempotency_key = (call.method == Method::Post).then(|| {
            call.idempotency_key.map_or_else(|| Uuid::new_v4().to_string(), str::to_owned)
        });

        let attempt = Attempt {
            method: call.method,
            path: &path,
            query: call.query,
            body: call.body,
            idempotency_key: idempotency_key.as_deref(),
            key,
        };

        let value = retry_with_backoff(&self.retry_policy, move || self.send(attempt)).await?;

        serde_json::from_value(value).map_err(|e| {
            PaygateError::Decode(format!("{} {path}: {e}", call.method))
        })
    }

    async fn send(&self, attempt: Attempt<'_>) -> Result<Value> {
        let mut headers = vec![("Accept", JSON), ("User-Agent", USER_AGENT)];
        if let Some(version) = &self.api_version {
            headers.push(("Paygate-Version", version.as_str()));
        }
        if let Some(key) = attempt.idempotency_key {
            headers.push(("Idempotency-Key", key));
        }

        let ctx = RequestContext {
            base_url: &self.base_url,
            path: attempt.path,
            query: attempt.query,
            headers,
            content_type: attempt.body.map(|_| JSON),
            auth_scheme: self.auth_scheme,
        };

        let response = match attempt.method {
            Method::Get => self.transport.get(attempt.key, ctx).await?,
            Method::Delete => self.transport.delete(attempt.key, ctx).await?,
            Method::Post => {
                self.transport.post(attempt.key, ctx, attempt.body.unwrap_or_default()).await?
            }
            Method::Patch => {
                self.transport.patch(attempt.key, ctx, attempt.body.unwrap_or_default()).await?
            }
        };

        let request_id = response.header(REQUEST_ID_HEADER).map(str::to_owned);
        tracing::debug!(
            method = %attempt.method,
            path = attempt.path,
            status = response.status,
            request_id = request_id.as_deref(),
            "gateway response"
        );

        let body = parse_body(&response.body);

        if !response.is_success() {
            let body = body.unwrap_or_else(|| {
                Value::String(String::from_utf8_lossy(&response.body).into_owned())
            });
            let retry_after = response.header("retry-after").and_then(parse_retry_after);
            return Err(ApiError::from_body(response.status, &body)
                .with_request_id(request_id)
                .with_retry_after(retry_after)
                .into());
        }

        let body = body.ok_or_else(|| {
            PaygateError::Decode(format!(
                "{} {}: response body is not JSON",
                attempt.method, attempt.path
            ))
        })?;

        if ApiError::is_failure(&body) {
            return Err(ApiError::from_body(response.status, &body)
                .with_request_id(request_id)
                .into());
        }

        Ok(body)
    }
}

/// Parameters of one logical call.
#[derive(Debug, Clone, Copy)]
struct Call<'a> {
    method: Method,
    path: &'a str,
    query: &'a [(String, String)],
    body: Option<&'a [u8]>,
    idempotency_key: Option<&'a str>,
    key: KeyKind,
}

impl<'a> Call<'a> {
    const fn new(method: Method, path: &'a str) -> Self {
        Self { method, path, query: &[], body: None, idempotency_key: None, key: KeyKind::Secret }
    }
}

/// Resolved parameters of one attempt of a call.
#[derive(Debug, Clone, Copy)]
struct Attempt<'a> {
    method: Method,
    path: &'a str,
    query: &'a [(String, String)],
    body: Option<&'a [u8]>,
    idempotency_key: Option<&'a str>,
    key: &'a ApiKey,
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|e| PaygateError::Serialization(e.to_string()))
}

/// Empty bodies decode as `null`; `None` means the body is not JSON.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Value::Null);
    }
    serde_json::from_slice(bytes).ok()
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Builder for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    credentials: Option<Credentials>,
    base_url: String,
    api_prefix: String,
    api_version: Option<String>,
    auth_scheme: AuthScheme,
    retry_policy: RetryPolicy,
    http_config: Option<HttpConfig>,
    allow_insecure_http: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_prefix: DEFAULT_API_PREFIX.to_owned(),
            api_version: None,
            auth_scheme: AuthScheme::default(),
            retry_policy: RetryPolicy::default(),
            http_config: None,
            allow_insecure_http: false,
        }
    }
}

impl ClientBuilder {
    /// Sets the API keys. Required.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Overrides the gateway base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the API prefix (default `/v1`).
    #[must_use]
    pub fn api_prefix(mut self, api_prefix: impl Into<String>) -> Self {
        self.api_prefix = api_prefix.into();
        self
    }

    /// Pins the API version sent as `Paygate-Version`.
    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Sets how keys are presented.
    #[must_use]
    pub const fn auth_scheme(mut self, auth_scheme: AuthScheme) -> Self {
        self.auth_scheme = auth_scheme;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Uses a dedicated HTTP client with these settings instead of the
    /// shared default one.
    #[must_use]
    pub fn http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = Some(http_config);
        self
    }

    /// Permits plain HTTP and loopback base URLs, for local mock servers.
    #[must_use]
    pub const fn allow_insecure_http(mut self, allow: bool) -> Self {
        self.allow_insecure_http = allow;
        self
    }

    /// Builds a client on the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if credentials are missing or a
    /// setting is invalid.
    pub fn build(self) -> Result<Client> {
        let transport = match &self.http_config {
            Some(config) => HttpTransport::with_config(config)?,
            None => HttpTransport::new()?,
        }
        .allow_insecure(self.allow_insecure_http);
        self.build_with_transport(transport)
    }

    pub(crate) fn build_with_transport<T: Transport>(self, transport: T) -> Result<Client<T>> {
        let credentials = self
            .credentials
            .ok_or_else(|| PaygateError::Config("credentials are required".to_owned()))?;

        config::validate_base_url(&self.base_url, self.allow_insecure_http)?;
        config::validate_api_prefix(&self.api_prefix)?;
        if let Some(version) = &self.api_version {
            config::validate_api_version(version)?;
        }

        Ok(Client {
            transport,
            credentials,
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            api_prefix: self.api_prefix.trim_end_matches('/').to_owned(),
            api_version: self.api_version,
            auth_scheme: self.auth_scheme,
            retry_policy: self.retry_policy,
        })
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{testing::mock_client, *};
    use crate::transport::TransportResponse;

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("paygate-rust/"));
    }

    #[test]
    fn test_builder_requires_credentials() {
        let result = Client::builder().build();
        assert!(matches!(result, Err(PaygateError::Config(msg)) if msg.contains("credentials")));
    }

    #[test]
    fn test_builder_validates_settings() {
        let credentials = || Credentials::new("skey_test_123").unwrap();

        assert!(Client::builder().credentials(credentials()).base_url("http://x.dev").build().is_err());
        assert!(Client::builder().credentials(credentials()).api_prefix("v1").build().is_err());
        assert!(Client::builder().credentials(credentials()).api_version("v1").build().is_err());
        assert!(
            Client::builder()
                .credentials(credentials())
                .base_url("http://127.0.0.1:9999")
                .allow_insecure_http(true)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_builder_trims_trailing_slashes() {
        let client = Client::builder()
            .credentials(Credentials::new("skey_live_123").unwrap())
            .base_url("https://api.paygate.dev/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://api.paygate.dev");
        assert!(!client.is_test_mode());
    }

    #[tokio::test]
    async fn test_get_sends_standard_headers() {
        let client = mock_client();
        client.transport().push_json(200, &json!({"object": "account", "id": "acct_1"}));

        let _: Value = client.get("/account").await.unwrap();

        let request = client.transport().last_request();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/v1/account");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.header("User-Agent"), Some(USER_AGENT));
        assert_eq!(request.header("Paygate-Version"), Some("2024-06-01"));
        assert!(request.header("Idempotency-Key").is_none());
        assert!(request.header("Content-Type").is_none());
        assert!(request.authorization.starts_with("Basic "));
    }

    #[tokio::test]
    async fn test_post_sends_body_and_idempotency_key() {
        let client = mock_client();
        client.transport().push_json(200, &json!({"ok": true}));

        let _: Value = client.post("/charges", &json!({"amount": 100}), None).await.unwrap();

        let request = client.transport().last_request();
        assert_eq!(request.body, Some(json!({"amount": 100})));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        let key = request.header("Idempotency-Key").unwrap();
        assert!(Uuid::parse_str(key).is_ok());
    }

    #[tokio::test]
    async fn test_retry_reuses_idempotency_key() {
        let client = mock_client();
        client.transport().push_json(503, &json!({"object": "error", "code": "unavailable"}));
        client.transport().push_json(502, &json!({}));
        client.transport().push_json(200, &json!({"ok": true}));

        let _: Value = client.post("/charges", &json!({}), Some("order-42")).await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            assert_eq!(request.header("Idempotency-Key"), Some("order-42"));
        }
    }

    #[tokio::test]
    async fn test_generated_idempotency_key_is_stable_across_retries() {
        let client = mock_client();
        client.transport().push_json(500, &json!({}));
        client.transport().push_json(200, &json!({}));

        let _: Value = client.post("/transfers", &json!({}), None).await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].header("Idempotency-Key"), requests[1].header("Idempotency-Key"));
    }

    #[tokio::test]
    async fn test_non_2xx_maps_to_api_error() {
        let client = mock_client();
        client.transport().push(TransportResponse {
            status: 402,
            body: serde_json::to_vec(&json!({
                "object": "error",
                "status": "failure",
                "code": "card_declined",
                "message": "insufficient funds",
                "errors": [{"field": "card", "code": "declined", "message": "insufficient funds"}]
            }))
            .unwrap(),
            headers: vec![("paygate-request-id".to_owned(), "req_9".to_owned())],
        });

        let err = client.get::<Value>("/charges/chrg_1").await.unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.status, 402);
        assert_eq!(api.code, "card_declined");
        assert_eq!(api.errors.len(), 1);
        assert_eq!(err.request_id(), Some("req_9"));
        assert!(!err.is_transport());
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_envelope_with_200_is_api_error() {
        let client = mock_client();
        client.transport().push_json(
            200,
            &json!({"object": "charge", "status": "failure", "code": "failed_processing", "message": "declined"}),
        );

        let err = client.get::<Value>("/charges/chrg_1").await.unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.status, 200);
        assert_eq!(api.code, "failed_processing");
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let client = mock_client();
        for _ in 0..3 {
            client.transport().push(TransportResponse {
                status: 429,
                body: b"slow down".to_vec(),
                headers: vec![("retry-after".to_owned(), "0".to_owned())],
            });
        }

        let err = client.get::<Value>("/balance").await.unwrap_err();
        let api = err.api_error().unwrap();
        assert!(api.is_rate_limited());
        assert_eq!(api.message, "slow down");
        assert_eq!(api.retry_after, Some(Duration::from_secs(0)));
        assert_eq!(client.transport().requests().len(), 3);
    }

    #[tokio::test]
    async fn test_non_json_success_is_decode_error() {
        let client = mock_client();
        client.transport().push(TransportResponse {
            status: 200,
            body: b"<html>".to_vec(),
            headers: vec![],
        });

        let err = client.get::<Value>("/balance").await.unwrap_err();
        assert!(matches!(err, PaygateError::Decode(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code, reason = "field read through deserialization only")]
        struct Needs {
            amount: i64,
        }

        let client = mock_client();
        client.transport().push_json(200, &json!({"amount": "ten"}));

        let err = client.get::<Needs>("/charges/chrg_1").await.unwrap_err();
        assert!(matches!(err, PaygateError::Decode(msg) if msg.contains("/v1/charges/chrg_1")));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_null() {
        let client = mock_client();
        client.transport().push(TransportResponse { status: 204, body: vec![], headers: vec![] });

        let value: Value = client.delete("/webhook_endpoints/whep_1").await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_list_validates_before_sending() {
        let client = mock_client();
        let err = client.list::<Value>("/charges", &ListParams::new().limit(500)).await.unwrap_err();
        assert!(matches!(err, PaygateError::InvalidInput(_)));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_public_key_calls() {
        let client = mock_client();
        client.transport().push_json(200, &json!({"id": "tokn_1"}));

        let _: Value = client.get_public("/tokens/tokn_1").await.unwrap();

        let expected = client.credentials.public().unwrap().authorization(AuthScheme::Basic);
        assert_eq!(client.transport().last_request().authorization, expected);
    }

    #[tokio::test]
    async fn test_public_key_missing_is_config_error() {
        let client = Client::builder()
            .credentials(Credentials::new("skey_test_123").unwrap())
            .build_with_transport(crate::transport::mock::MockTransport::new())
            .unwrap();

        let err = client.get_public::<Value>("/tokens/tokn_1").await.unwrap_err();
        assert!(matches!(err, PaygateError::Config(_)));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(" 10 "), Some(Duration::from_secs(10)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
