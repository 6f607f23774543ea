//! Configuration loading tests.

use paygate::{AuthScheme, ClientConfig, PaygateError, transport::HttpVersion};

#[test]
fn test_full_client_configuration() {
    let toml = r#"
        base_url = "https://sandbox.paygate.dev"
        api_prefix = "/v1"
        api_version = "2024-06-01"
        auth_scheme = "bearer"

        [credentials]
        secret_key_env = "SHOP_PAYGATE_SECRET"
        public_key_env = "SHOP_PAYGATE_PUBLIC"

        [http]
        timeout_secs = 10
        http_version = "http1"

        [retry]
        max_attempts = 4
        initial_delay_ms = 100
        max_delay_ms = 2000
    "#;

    let config = ClientConfig::from_toml(toml).expect("should parse valid TOML");

    assert_eq!(config.base_url, "https://sandbox.paygate.dev");
    assert_eq!(config.api_version.as_deref(), Some("2024-06-01"));
    assert_eq!(config.auth_scheme, AuthScheme::Bearer);
    assert_eq!(config.credentials.secret_key_env, "SHOP_PAYGATE_SECRET");
    assert_eq!(config.http.timeout_secs, 10);
    assert_eq!(config.http.http_version, HttpVersion::Http1);

    let policy = config.retry.policy();
    assert_eq!(policy.max_attempts, 4);
    assert_eq!(policy.initial_delay.as_millis(), 100);
    assert_eq!(policy.max_delay.as_millis(), 2000);
}

#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("paygate-config-{}.toml", std::process::id()));
    std::fs::write(&path, "api_version = \"2024-06-01\"\n").expect("write temp config");

    let config = ClientConfig::from_file(&path).expect("file should load");
    std::fs::remove_file(&path).ok();

    assert_eq!(config.base_url, "https://api.paygate.dev");
    assert_eq!(config.api_prefix, "/v1");
}

#[test]
fn test_missing_file_is_config_error() {
    let result = ClientConfig::from_file("/nonexistent/paygate.toml");
    assert!(matches!(result, Err(PaygateError::Config(msg)) if msg.contains("cannot read")));
}

#[test]
fn test_invalid_configurations_rejected() {
    let cases = [
        r#"base_url = "http://api.paygate.dev""#,
        r#"api_prefix = "v1""#,
        r#"api_version = "June 2024""#,
        "[retry]\nmax_attempts = 0",
        "[credentials]\nsecret_key_env = \"lower-case\"",
    ];
    for toml in cases {
        assert!(
            matches!(ClientConfig::from_toml(toml), Err(PaygateError::Config(_))),
            "accepted {toml:?}"
        );
    }
}
