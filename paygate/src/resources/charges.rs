//! Charges: creating, capturing and reversing card payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::{Empty, cards::Card, path_id, validate_amount, validate_currency},
    transport::{HttpTransport, Transport},
    types::{ListParams, Metadata, Nullable, Pageable, Paginator},
};

/// Lifecycle status of a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    /// Authorized or awaiting capture.
    Pending,
    /// Captured.
    Successful,
    /// Declined or failed processing.
    Failed,
    /// Authorization released before capture.
    Reversed,
    /// Authorization expired before capture.
    Expired,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Always `"charge"`.
    pub object: String,
    /// Charge id (`chrg_...`).
    pub id: String,
    /// Whether the charge was made with live keys.
    #[serde(default)]
    pub livemode: bool,
    /// API path of this charge.
    #[serde(default)]
    pub location: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    /// Lowercase ISO 4217 currency.
    pub currency: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current status.
    pub status: ChargeStatus,
    /// Whether the charge is captured automatically.
    #[serde(default)]
    pub capture: bool,
    /// Whether the card issuer authorized the amount.
    #[serde(default)]
    pub authorized: bool,
    /// Whether the amount was captured.
    #[serde(default)]
    pub paid: bool,
    /// Whether the authorization was reversed.
    #[serde(default)]
    pub reversed: bool,
    /// Sum of all refunds, in minor units.
    #[serde(default)]
    pub refunded_amount: i64,
    /// Card that was charged.
    #[serde(default)]
    pub card: Option<Card>,
    /// Customer id, when a saved card was charged.
    #[serde(default)]
    pub customer: Option<String>,
    /// Decline code.
    #[serde(default)]
    pub failure_code: Option<String>,
    /// Decline message.
    #[serde(default)]
    pub failure_message: Option<String>,
    /// Merchant key-value data.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Charge {
    /// Amount that can still be refunded.
    #[must_use]
    pub const fn refundable_amount(&self) -> i64 {
        if self.paid { self.amount - self.refunded_amount } else { 0 }
    }
}

/// Parameters of [`Charges::create`].
///
/// Either `card` (a token or card id) or `customer` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateCharge {
    /// Amount in minor units.
    pub amount: i64,
    /// ISO 4217 currency.
    pub currency: String,
    /// Card token (`tokn_...`), or card id when `customer` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    /// Customer whose default card is charged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `false` only authorizes; capture later with [`Charges::capture`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>,
    /// Where the customer returns after 3-D Secure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_uri: Option<String>,
    /// Merchant key-value data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CreateCharge {
    /// Starts a charge of `amount` minor units.
    #[must_use]
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self { amount, currency: currency.into(), ..Self::default() }
    }

    /// Charges a card token or card id.
    #[must_use]
    pub fn card(mut self, card: impl Into<String>) -> Self {
        self.card = Some(card.into());
        self
    }

    /// Charges a saved customer.
    #[must_use]
    pub fn customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Authorizes only.
    #[must_use]
    pub const fn authorize_only(mut self) -> Self {
        self.capture = Some(false);
        self
    }

    fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_currency(&self.currency)?;
        if self.card.is_none() && self.customer.is_none() {
            return Err(PaygateError::InvalidInput(
                "a charge needs a card or a customer".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Parameters of [`Charges::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateCharge {
    /// New description; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub description: Nullable<String>,
    /// New metadata; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub metadata: Nullable<Metadata>,
}

/// Charges service.
#[derive(Debug)]
pub struct Charges<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Charges<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Creates a charge.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] for a non-positive amount, a
    /// malformed currency or a missing payment source, and
    /// [`PaygateError::Api`] when the gateway declines.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use paygate::{Client, auth::Credentials, resources::charges::CreateCharge};
    ///
    /// # async fn example() -> paygate::error::Result<()> {
    /// let client = Client::new(Credentials::new("skey_test_123")?)?;
    ///
    /// let charge = client
    ///     .charges()
    ///     .create(&CreateCharge::new(10_000, "thb").card("tokn_test_5g5mep").description("order 42"))
    ///     .await?;
    /// println!("{} is {:?}", charge.id, charge.status);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, params), fields(amount = params.amount, currency = %params.currency))]
    pub async fn create(&self, params: &CreateCharge) -> Result<Charge> {
        params.validate()?;
        self.client.post("/charges", params, None).await
    }

    /// Creates a charge with a caller-chosen idempotency key.
    ///
    /// Repeating the call with the same key returns the original charge
    /// instead of charging twice.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub async fn create_with_idempotency_key(
        &self,
        params: &CreateCharge,
        idempotency_key: &str,
    ) -> Result<Charge> {
        params.validate()?;
        self.client.post("/charges", params, Some(idempotency_key)).await
    }

    /// Retrieves a charge.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Charge> {
        let id = path_id("charge id", id)?;
        self.client.get(&format!("/charges/{id}")).await
    }

    /// Updates the description or metadata of a charge.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn update(&self, id: &str, params: &UpdateCharge) -> Result<Charge> {
        let id = path_id("charge id", id)?;
        self.client.patch(&format!("/charges/{id}"), params).await
    }

    /// Captures an authorized charge.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    #[instrument(skip(self))]
    pub async fn capture(&self, id: &str) -> Result<Charge> {
        let id = path_id("charge id", id)?;
        self.client.post(&format!("/charges/{id}/capture"), &Empty {}, None).await
    }

    /// Releases an authorization without capturing it.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    #[instrument(skip(self))]
    pub async fn reverse(&self, id: &str) -> Result<Charge> {
        let id = path_id("charge id", id)?;
        self.client.post(&format!("/charges/{id}/reverse"), &Empty {}, None).await
    }

    /// Lists one page of charges.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<Charge>> {
        self.client.list("/charges", params).await
    }

    /// Walks all charges matching `params`.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, Charge, T> {
        Paginator::new(self.client, "/charges".to_owned(), params)
    }
}
