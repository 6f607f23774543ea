//! Client configuration.
//!
//! This module defines the TOML-deserializable configuration of a
//! [`Client`](crate::Client). Keys never appear in the file: the
//! `[credentials]` table names the environment variables holding them.
//!
//! # Examples
//!
//! ```
//! use paygate::config::ClientConfig;
//!
//! let config = ClientConfig::from_toml(
//!     r#"
//!     base_url = "https://api.paygate.dev"
//!     api_version = "2024-06-01"
//!
//!     [retry]
//!     max_attempts = 5
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.api_prefix, "/v1");
//! assert_eq!(config.retry.max_attempts, 5);
//! ```

use std::{path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{
    auth::{AuthScheme, DEFAULT_PUBLIC_KEY_ENV, DEFAULT_SECRET_KEY_ENV},
    error::{PaygateError, Result},
    reliability::RetryPolicy,
    transport::{HttpConfig, http::is_loopback},
};

/// Production gateway URL.
pub const DEFAULT_BASE_URL: &str = "https://api.paygate.dev";

/// API path prefix prepended to every resource path.
pub const DEFAULT_API_PREFIX: &str = "/v1";

/// Root client configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Gateway base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version prefix (e.g. "/v1").
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Value of the `Paygate-Version` header, `YYYY-MM-DD`.
    #[serde(default)]
    pub api_version: Option<String>,

    /// How API keys are presented.
    #[serde(default)]
    pub auth_scheme: AuthScheme,

    /// Permits plain HTTP and loopback hosts, for local mock servers.
    #[serde(default)]
    pub allow_insecure_http: bool,

    /// Where keys are read from.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry settings.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            api_version: None,
            auth_scheme: AuthScheme::default(),
            allow_insecure_http: false,
            credentials: CredentialsConfig::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if parsing or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| PaygateError::Config(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the file cannot be read or is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PaygateError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Validates the configuration.
    ///
    /// This method checks that:
    /// - `base_url` parses and uses HTTPS, without loopback hosts, unless
    ///   `allow_insecure_http` is set
    /// - `api_prefix` is empty or starts with `/` and has no `..` or `//`
    /// - `api_version` is a `YYYY-MM-DD` date
    /// - credential environment variable names use `[A-Z0-9_]`
    /// - HTTP timeouts and retry attempts are within bounds
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] on the first failing check.
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.base_url, self.allow_insecure_http)?;
        validate_api_prefix(&self.api_prefix)?;
        if let Some(version) = &self.api_version {
            validate_api_version(version)?;
        }
        self.credentials.validate()?;
        self.http.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

/// Environment variables holding the API keys.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CredentialsConfig {
    /// Variable with the secret key.
    #[serde(default = "default_secret_key_env")]
    pub secret_key_env: String,
    /// Variable with the public key. Optional at runtime.
    #[serde(default = "default_public_key_env")]
    pub public_key_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            secret_key_env: default_secret_key_env(),
            public_key_env: default_public_key_env(),
        }
    }
}

impl CredentialsConfig {
    fn validate(&self) -> Result<()> {
        validate_env_var_name(&self.secret_key_env)?;
        validate_env_var_name(&self.public_key_env)
    }
}

/// Retry settings, converted into a [`RetryPolicy`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts including the first one, 1..=10.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound for any delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.max_attempts) {
            return Err(PaygateError::Config("retry.max_attempts must be between 1 and 10".to_owned()));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(PaygateError::Config(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms".to_owned(),
            ));
        }
        Ok(())
    }

    /// Builds the retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Validates the gateway base URL.
pub(crate) fn validate_base_url(base_url: &str, allow_insecure: bool) -> Result<()> {
    let url = Url::parse(base_url)
        .map_err(|e| PaygateError::Config(format!("invalid base_url '{base_url}': {e}")))?;

    match (url.scheme(), allow_insecure) {
        ("https", _) | ("http", true) => {}
        (scheme, _) => {
            return Err(PaygateError::Config(format!("base_url must use HTTPS, got: {scheme}")));
        }
    }

    let Some(host) = url.host_str() else {
        return Err(PaygateError::Config(format!("base_url has no host: {base_url}")));
    };

    if !allow_insecure && is_loopback(host) {
        return Err(PaygateError::Config(format!(
            "base_url must not be localhost or loopback: {host}"
        )));
    }

    Ok(())
}

/// Validates the API path prefix.
pub(crate) fn validate_api_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Ok(());
    }
    if !prefix.starts_with('/') {
        return Err(PaygateError::Config(format!("api_prefix must start with '/': {prefix}")));
    }
    if prefix.contains("..") || prefix.contains("//") {
        return Err(PaygateError::Config(format!(
            "api_prefix contains a traversal sequence: {prefix}"
        )));
    }
    Ok(())
}

/// Validates an API version date (`YYYY-MM-DD`).
pub(crate) fn validate_api_version(version: &str) -> Result<()> {
    chrono::NaiveDate::parse_from_str(version, "%Y-%m-%d")
        .ok()
        .filter(|_| version.len() == 10)
        .map(|_| ())
        .ok_or_else(|| PaygateError::Config(format!("api_version must be YYYY-MM-DD: {version}")))
}

/// Validates an environment variable name.
fn validate_env_var_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PaygateError::Config("environment variable name cannot be empty".to_owned()));
    }

    if let Some(ch) = name.chars().find(|ch| !matches!(ch, 'A'..='Z' | '0'..='9' | '_')) {
        return Err(PaygateError::Config(format!(
            "environment variable name contains invalid character '{ch}': {name}"
        )));
    }

    Ok(())
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_owned()
}

fn default_secret_key_env() -> String {
    DEFAULT_SECRET_KEY_ENV.to_owned()
}

fn default_public_key_env() -> String {
    DEFAULT_PUBLIC_KEY_ENV.to_owned()
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    200
}

const fn default_max_delay_ms() -> u64 {
    5000
}
