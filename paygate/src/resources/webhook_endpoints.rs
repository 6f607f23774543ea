//! Registered webhook destinations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::path_id,
    transport::{HttpTransport, Transport},
    types::{Deleted, ListParams, Nullable, Pageable, Paginator},
};

/// A webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    /// Always `"webhook_endpoint"`.
    pub object: String,
    /// Endpoint id (`wbhk_...`).
    pub id: String,
    /// Whether the endpoint belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Delivery URL.
    pub url: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Event keys delivered; empty means all.
    #[serde(default)]
    pub events: Vec<String>,
    /// Deliveries are paused while disabled.
    #[serde(default)]
    pub enabled: bool,
    /// Signing secret (`whsec_...`). Only returned on create.
    #[serde(default)]
    pub secret: Option<String>,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// Parameters of [`WebhookEndpoints::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateWebhookEndpoint {
    /// HTTPS delivery URL.
    pub url: String,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Event keys to deliver; empty subscribes to all.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

impl CreateWebhookEndpoint {
    /// Endpoint receiving every event at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }
}

/// Parameters of [`WebhookEndpoints::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateWebhookEndpoint {
    /// New HTTPS delivery URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Description; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub description: Nullable<String>,
    /// Replaces the event filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    /// Enables or disables deliveries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

fn validate_endpoint_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|e| PaygateError::InvalidInput(format!("invalid webhook URL '{url}': {e}")))?;
    if parsed.scheme() != "https" {
        return Err(PaygateError::InvalidInput(format!("webhook URL must use HTTPS: {url}")));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(PaygateError::InvalidInput(format!("webhook URL has no host: {url}")));
    }
    Ok(())
}

/// Webhook endpoints service.
#[derive(Debug)]
pub struct WebhookEndpoints<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> WebhookEndpoints<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Registers an endpoint. The response carries the signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] unless the URL is absolute HTTPS.
    pub async fn create(&self, params: &CreateWebhookEndpoint) -> Result<WebhookEndpoint> {
        validate_endpoint_url(&params.url)?;
        self.client.post("/webhook_endpoints", params, None).await
    }

    /// Retrieves an endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<WebhookEndpoint> {
        let id = path_id("webhook endpoint id", id)?;
        self.client.get(&format!("/webhook_endpoints/{id}")).await
    }

    /// Updates an endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty, a new URL is not HTTPS or the
    /// request fails.
    pub async fn update(&self, id: &str, params: &UpdateWebhookEndpoint) -> Result<WebhookEndpoint> {
        let id = path_id("webhook endpoint id", id)?;
        if let Some(url) = &params.url {
            validate_endpoint_url(url)?;
        }
        self.client.patch(&format!("/webhook_endpoints/{id}"), params).await
    }

    /// Deletes an endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn delete(&self, id: &str) -> Result<Deleted> {
        let id = path_id("webhook endpoint id", id)?;
        self.client.delete(&format!("/webhook_endpoints/{id}")).await
    }

    /// Lists one page of endpoints.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<WebhookEndpoint>> {
        self.client.list("/webhook_endpoints", params).await
    }

    /// Walks all endpoints.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, WebhookEndpoint, T> {
        Paginator::new(self.client, "/webhook_endpoints".to_owned(), params)
    }
}
