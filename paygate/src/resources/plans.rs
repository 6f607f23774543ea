//! Recurring billing plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::{path_id, validate_amount, validate_currency},
    transport::{HttpTransport, Transport},
    types::{Deleted, ListParams, Metadata, Nullable, Pageable, Paginator},
};

/// Billing period unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    /// Daily.
    Day,
    /// Weekly.
    Week,
    /// Monthly.
    Month,
    /// Yearly.
    Year,
}

/// A plan: an amount billed every `interval_count` intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Always `"plan"`.
    pub object: String,
    /// Plan id.
    pub id: String,
    /// Whether the plan belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Display name.
    pub name: String,
    /// Amount billed per period, in minor units.
    pub amount: i64,
    /// ISO 4217 currency.
    pub currency: String,
    /// Period unit.
    pub interval: Interval,
    /// Number of units per period.
    #[serde(default = "one")]
    pub interval_count: u32,
    /// Free trial length for new subscriptions.
    #[serde(default)]
    pub trial_period_days: Option<u32>,
    /// Inactive plans accept no new subscriptions.
    #[serde(default = "yes")]
    pub active: bool,
    /// Merchant key-value data.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time.
    pub created: DateTime<Utc>,
}

const fn one() -> u32 {
    1
}

const fn yes() -> bool {
    true
}

/// Parameters of [`Plans::create`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePlan {
    /// Plan id; generated by the gateway when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Amount per period in minor units.
    pub amount: i64,
    /// ISO 4217 currency.
    pub currency: String,
    /// Period unit.
    pub interval: Interval,
    /// Units per period, at least 1.
    pub interval_count: u32,
    /// Free trial length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_period_days: Option<u32>,
    /// Merchant key-value data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CreatePlan {
    /// Plan billing `amount` every `interval`.
    #[must_use]
    pub fn new(name: impl Into<String>, amount: i64, currency: impl Into<String>, interval: Interval) -> Self {
        Self {
            id: None,
            name: name.into(),
            amount,
            currency: currency.into(),
            interval,
            interval_count: 1,
            trial_period_days: None,
            metadata: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PaygateError::InvalidInput("plan name must not be empty".to_owned()));
        }
        validate_amount(self.amount)?;
        validate_currency(&self.currency)?;
        validate_interval_count(self.interval_count)
    }
}

fn validate_interval_count(count: u32) -> Result<()> {
    if count == 0 {
        return Err(PaygateError::InvalidInput("interval_count must be at least 1".to_owned()));
    }
    Ok(())
}

/// Parameters of [`Plans::update`].
///
/// Amount and interval are fixed once a plan exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdatePlan {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Activates or deactivates the plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Trial length; `Null` removes the trial.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub trial_period_days: Nullable<u32>,
    /// Metadata; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub metadata: Nullable<Metadata>,
}

/// Plans service.
#[derive(Debug)]
pub struct Plans<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Plans<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Creates a plan.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] for an empty name, a
    /// non-positive amount, a malformed currency or a zero interval count.
    pub async fn create(&self, params: &CreatePlan) -> Result<Plan> {
        params.validate()?;
        self.client.post("/plans", params, None).await
    }

    /// Retrieves a plan.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Plan> {
        let id = path_id("plan id", id)?;
        self.client.get(&format!("/plans/{id}")).await
    }

    /// Updates a plan.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn update(&self, id: &str, params: &UpdatePlan) -> Result<Plan> {
        let id = path_id("plan id", id)?;
        self.client.patch(&format!("/plans/{id}"), params).await
    }

    /// Deletes a plan. Existing subscriptions keep running.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn delete(&self, id: &str) -> Result<Deleted> {
        let id = path_id("plan id", id)?;
        self.client.delete(&format!("/plans/{id}")).await
    }

    /// Lists one page of plans.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<Plan>> {
        self.client.list("/plans", params).await
    }

    /// Walks all plans.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, Plan, T> {
        Paginator::new(self.client, "/plans".to_owned(), params)
    }
}
