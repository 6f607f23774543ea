//! API keys and request authentication.
//!
//! The gateway issues two kinds of keys:
//!
//! - **secret keys** (`skey_...`) authenticate every server-side call,
//! - **public keys** (`pkey_...`) may only create and read card tokens.
//!
//! Keys containing `_test_` belong to the sandbox. Key material is wiped from
//! memory when an [`ApiKey`] is dropped and never appears in `Debug` output.
//!
//! # Examples
//!
//! ```
//! use paygate::auth::{ApiKey, AuthScheme, KeyKind};
//!
//! let key = ApiKey::new("skey_test_5xuy4w91xqz7d1w9u0t").unwrap();
//! assert_eq!(key.kind(), KeyKind::Secret);
//! assert!(key.is_test_mode());
//! assert!(key.authorization(AuthScheme::Bearer).starts_with("Bearer "));
//! assert!(!format!("{key:?}").contains("5xuy4w91"));
//! ```

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use zeroize::Zeroize;

use crate::error::{PaygateError, Result};

/// Prefix of secret keys.
pub const SECRET_KEY_PREFIX: &str = "skey_";

/// Prefix of public keys.
pub const PUBLIC_KEY_PREFIX: &str = "pkey_";

/// Default environment variable holding the secret key.
pub const DEFAULT_SECRET_KEY_ENV: &str = "PAYGATE_SECRET_KEY";

/// Default environment variable holding the public key.
pub const DEFAULT_PUBLIC_KEY_ENV: &str = "PAYGATE_PUBLIC_KEY";

/// Kind of API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Secret key, full API access.
    Secret,
    /// Public key, tokenization only.
    Public,
}

/// How the key is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Basic base64("<key>:")`.
    #[default]
    Basic,
    /// `Authorization: Bearer <key>`.
    Bearer,
}

/// A gateway API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    value: String,
    kind: KeyKind,
}

impl ApiKey {
    /// Parses an API key.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the key is empty, contains
    /// whitespace or control characters, or does not start with `skey_` or
    /// `pkey_`.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let mut raw = value.into();
        let mut value = raw.trim().to_owned();
        raw.zeroize();

        let kind = if value.starts_with(SECRET_KEY_PREFIX) {
            KeyKind::Secret
        } else if value.starts_with(PUBLIC_KEY_PREFIX) {
            KeyKind::Public
        } else {
            value.zeroize();
            return Err(PaygateError::Config(format!(
                "API key must start with '{SECRET_KEY_PREFIX}' or '{PUBLIC_KEY_PREFIX}'"
            )));
        };

        if value.len() <= SECRET_KEY_PREFIX.len()
            || value.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            value.zeroize();
            return Err(PaygateError::Config("API key is malformed".to_owned()));
        }

        Ok(Self { value, kind })
    }

    /// Reads an API key from an environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the variable is unset or holds an
    /// invalid key.
    pub fn from_env(var: &str) -> Result<Self> {
        let value = std::env::var(var)
            .map_err(|_| PaygateError::Config(format!("environment variable {var} is not set")))?;
        Self::new(value)
    }

    /// Returns the key kind.
    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Returns true for sandbox keys.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.value.contains("_test_")
    }

    /// Exposes the raw key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Builds the `Authorization` header value for this key.
    #[must_use]
    pub fn authorization(&self, scheme: AuthScheme) -> String {
        match scheme {
            AuthScheme::Basic => {
                let mut raw = format!("{}:", self.value);
                let encoded = STANDARD.encode(raw.as_bytes());
                raw.zeroize();
                format!("Basic {encoded}")
            }
            AuthScheme::Bearer => format!("Bearer {}", self.value),
        }
    }

    fn redacted(&self) -> String {
        let prefix_len = if self.is_test_mode() {
            SECRET_KEY_PREFIX.len() + "test_".len()
        } else {
            SECRET_KEY_PREFIX.len()
        };
        let prefix = self.value.get(..prefix_len).unwrap_or_default();
        format!("{prefix}****")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey").field("key", &self.redacted()).field("kind", &self.kind).finish()
    }
}

impl Drop for ApiKey {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// Secret and optional public key used by a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct Credentials {
    secret: ApiKey,
    public: Option<ApiKey>,
}

impl Credentials {
    /// Creates credentials from a secret key.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the key is not a valid secret key.
    pub fn new(secret_key: impl Into<String>) -> Result<Self> {
        let secret = ApiKey::new(secret_key)?;
        if secret.kind() != KeyKind::Secret {
            return Err(PaygateError::Config("expected a secret key (skey_...)".to_owned()));
        }
        Ok(Self { secret, public: None })
    }

    /// Adds a public key for tokenization.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the key is not a valid public key,
    /// or if its mode (test/live) differs from the secret key.
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Result<Self> {
        let public = ApiKey::new(public_key)?;
        if public.kind() != KeyKind::Public {
            return Err(PaygateError::Config("expected a public key (pkey_...)".to_owned()));
        }
        if public.is_test_mode() != self.secret.is_test_mode() {
            return Err(PaygateError::Config(
                "public and secret keys must both be test keys or both be live keys".to_owned(),
            ));
        }
        self.public = Some(public);
        Ok(self)
    }

    /// Loads credentials from environment variables.
    ///
    /// The public key variable is optional; when it is unset or blank, token
    /// operations fail with [`PaygateError::Config`].
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if the secret key is missing or any
    /// present key is invalid.
    pub fn from_env(secret_var: &str, public_var: &str) -> Result<Self> {
        Self::from_lookup(secret_var, public_var, |name| std::env::var(name).ok())
    }

    /// A blank public key value counts as unset.
    fn from_lookup(
        secret_var: &str,
        public_var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let secret = lookup(secret_var).ok_or_else(|| {
            PaygateError::Config(format!("environment variable {secret_var} is not set"))
        })?;
        let credentials = Self::new(secret)?;
        match lookup(public_var) {
            Some(public) if !public.trim().is_empty() => credentials.with_public_key(public),
            _ => Ok(credentials),
        }
    }

    /// Returns the secret key.
    #[must_use]
    pub const fn secret(&self) -> &ApiKey {
        &self.secret
    }

    /// Returns the public key.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Config`] if no public key was configured.
    pub fn public(&self) -> Result<&ApiKey> {
        self.public.as_ref().ok_or_else(|| {
            PaygateError::Config("a public key is required for token operations".to_owned())
        })
    }

    /// Returns true when the credentials target the sandbox.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.secret.is_test_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_kind() {
        let key = ApiKey::new("skey_live_abc123").unwrap();
        assert_eq!(key.kind(), KeyKind::Secret);
        assert!(!key.is_test_mode());
    }

    #[test]
    fn test_public_key_kind() {
        let key = ApiKey::new("pkey_test_abc123").unwrap();
        assert_eq!(key.kind(), KeyKind::Public);
        assert!(key.is_test_mode());
    }

    #[test]
    fn test_key_is_trimmed() {
        let key = ApiKey::new("  skey_test_abc \n").unwrap();
        assert_eq!(key.expose(), "skey_test_abc");
    }

    #[test]
    fn test_invalid_keys_rejected() {
        for bad in ["", "sk_test_123", "skey_", "skey_te st", "pkey_\u{0007}x"] {
            assert!(ApiKey::new(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_basic_authorization() {
        let key = ApiKey::new("skey_test_123").unwrap();
        // base64("skey_test_123:")
        assert_eq!(key.authorization(AuthScheme::Basic), "Basic c2tleV90ZXN0XzEyMzo=");
    }

    #[test]
    fn test_bearer_authorization() {
        let key = ApiKey::new("skey_test_123").unwrap();
        assert_eq!(key.authorization(AuthScheme::Bearer), "Bearer skey_test_123");
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = ApiKey::new("skey_test_supersecret").unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("skey_test_****"));

        let live = ApiKey::new("skey_live_supersecret").unwrap();
        assert!(format!("{live:?}").contains("skey_****"));
    }

    #[test]
    fn test_credentials_require_secret_key() {
        assert!(Credentials::new("pkey_test_123").is_err());
        assert!(Credentials::new("skey_test_123").is_ok());
    }

    #[test]
    fn test_credentials_public_key_mode_must_match() {
        let creds = Credentials::new("skey_test_123").unwrap();
        assert!(creds.clone().with_public_key("pkey_live_123").is_err());
        assert!(creds.clone().with_public_key("skey_test_456").is_err());

        let creds = creds.with_public_key("pkey_test_456").unwrap();
        assert_eq!(creds.public().unwrap().expose(), "pkey_test_456");
    }

    #[test]
    fn test_missing_public_key() {
        let creds = Credentials::new("skey_test_123").unwrap();
        assert!(matches!(creds.public(), Err(PaygateError::Config(_))));
    }

    #[test]
    fn test_from_env_missing_variable() {
        let result = Credentials::from_env("PAYGATE_TEST_UNSET_SECRET", "PAYGATE_TEST_UNSET_PUBLIC");
        let Err(PaygateError::Config(msg)) = result else {
            unreachable!("expected Config error")
        };
        assert!(msg.contains("PAYGATE_TEST_UNSET_SECRET"));
    }

    #[test]
    fn test_from_lookup_blank_public_key_is_unset() {
        for blank in ["", "   "] {
            let creds = Credentials::from_lookup("SECRET", "PUBLIC", |name| match name {
                "SECRET" => Some("skey_test_123".to_owned()),
                "PUBLIC" => Some(blank.to_owned()),
                _ => None,
            })
            .unwrap();
            assert_eq!(creds.secret().expose(), "skey_test_123");
            assert!(creds.public().is_err());
        }
    }

    #[test]
    fn test_from_lookup_reads_public_key() {
        let creds = Credentials::from_lookup("SECRET", "PUBLIC", |name| match name {
            "SECRET" => Some("skey_test_123".to_owned()),
            "PUBLIC" => Some("pkey_test_456".to_owned()),
            _ => None,
        })
        .unwrap();
        assert_eq!(creds.public().unwrap().expose(), "pkey_test_456");
    }

    #[test]
    fn test_auth_scheme_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            scheme: AuthScheme,
        }
        let parsed: Wrapper = toml::from_str(r#"scheme = "bearer""#).unwrap();
        assert_eq!(parsed.scheme, AuthScheme::Bearer);
    }
}
