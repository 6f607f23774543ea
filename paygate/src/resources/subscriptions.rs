//! Subscriptions of customers to plans.
//!
//! Status transitions happen on the gateway; this client only requests them
//! through [`Subscriptions::cancel`], [`Subscriptions::pause`] and
//! [`Subscriptions::resume`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::{Empty, path_id},
    transport::{HttpTransport, Transport},
    types::{ListParams, Metadata, Nullable, Pageable, Paginator},
};

/// Status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In a free trial.
    Trialing,
    /// Billing normally.
    Active,
    /// Last charge failed; retrying.
    PastDue,
    /// Billing suspended until resumed.
    Paused,
    /// Ended.
    Canceled,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Always `"subscription"`.
    pub object: String,
    /// Subscription id.
    pub id: String,
    /// Whether the subscription belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Subscribed customer id.
    pub customer: String,
    /// Plan id.
    pub plan: String,
    /// Current status.
    pub status: SubscriptionStatus,
    /// Number of plan units billed.
    #[serde(default = "one")]
    pub quantity: u32,
    /// End of the free trial.
    #[serde(default)]
    pub trial_end: Option<DateTime<Utc>>,
    /// Start of the current billing period.
    #[serde(default)]
    pub current_period_start: Option<DateTime<Utc>>,
    /// End of the current billing period.
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    /// True when cancellation takes effect at the period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Merchant key-value data.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time.
    pub created: DateTime<Utc>,
}

const fn one() -> u32 {
    1
}

/// Parameters of [`Subscriptions::create`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateSubscription {
    /// Customer to bill.
    pub customer: String,
    /// Plan to subscribe to.
    pub plan: String,
    /// Units of the plan, at least 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Overrides the plan's trial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_end: Option<DateTime<Utc>>,
    /// Merchant key-value data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CreateSubscription {
    /// Subscribes `customer` to `plan`.
    #[must_use]
    pub fn new(customer: impl Into<String>, plan: impl Into<String>) -> Self {
        Self { customer: customer.into(), plan: plan.into(), ..Self::default() }
    }

    fn validate(&self) -> Result<()> {
        path_id("customer id", &self.customer)?;
        path_id("plan id", &self.plan)?;
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: Option<u32>) -> Result<()> {
    if quantity == Some(0) {
        return Err(PaygateError::InvalidInput("quantity must be at least 1".to_owned()));
    }
    Ok(())
}

/// Parameters of [`Subscriptions::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSubscription {
    /// Switches to another plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// New quantity, at least 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Trial end; `Null` ends the trial immediately.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub trial_end: Nullable<DateTime<Utc>>,
    /// Metadata; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub metadata: Nullable<Metadata>,
}

/// Parameters of [`Subscriptions::cancel`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CancelSubscription {
    /// Keeps the subscription until the current period ends.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub at_period_end: bool,
}

/// Subscriptions service.
#[derive(Debug)]
pub struct Subscriptions<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Subscriptions<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Subscribes a customer to a plan.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] for empty ids or a zero quantity.
    #[instrument(skip(self, params), fields(customer = %params.customer, plan = %params.plan))]
    pub async fn create(&self, params: &CreateSubscription) -> Result<Subscription> {
        params.validate()?;
        self.client.post("/subscriptions", params, None).await
    }

    /// Retrieves a subscription.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Subscription> {
        let id = path_id("subscription id", id)?;
        self.client.get(&format!("/subscriptions/{id}")).await
    }

    /// Updates a subscription.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty, the quantity is zero or the request
    /// fails.
    pub async fn update(&self, id: &str, params: &UpdateSubscription) -> Result<Subscription> {
        let id = path_id("subscription id", id)?;
        validate_quantity(params.quantity)?;
        self.client.patch(&format!("/subscriptions/{id}"), params).await
    }

    /// Cancels a subscription, now or at the end of the period.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    #[instrument(skip(self, params))]
    pub async fn cancel(&self, id: &str, params: &CancelSubscription) -> Result<Subscription> {
        let id = path_id("subscription id", id)?;
        self.client.post(&format!("/subscriptions/{id}/cancel"), params, None).await
    }

    /// Suspends billing.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn pause(&self, id: &str) -> Result<Subscription> {
        let id = path_id("subscription id", id)?;
        self.client.post(&format!("/subscriptions/{id}/pause"), &Empty {}, None).await
    }

    /// Resumes a paused subscription.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn resume(&self, id: &str) -> Result<Subscription> {
        let id = path_id("subscription id", id)?;
        self.client.post(&format!("/subscriptions/{id}/resume"), &Empty {}, None).await
    }

    /// Lists one page of subscriptions.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<Subscription>> {
        self.client.list("/subscriptions", params).await
    }

    /// Walks all subscriptions.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, Subscription, T> {
        Paginator::new(self.client, "/subscriptions".to_owned(), params)
    }
}
