//! Cards saved on customers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::path_id,
    transport::{HttpTransport, Transport},
    types::{Deleted, ListParams, Nullable, Pageable, Paginator},
};

/// A tokenized card.
///
/// Only the last four digits of the number are ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Always `"card"`.
    pub object: String,
    /// Card id (`card_...`).
    pub id: String,
    /// Whether the card belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Card network, e.g. `Visa`.
    #[serde(default)]
    pub brand: Option<String>,
    /// Last four digits of the number.
    #[serde(default)]
    pub last_digits: Option<String>,
    /// Card holder name.
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration month, 1..=12.
    pub expiration_month: u8,
    /// Four-digit expiration year.
    pub expiration_year: u16,
    /// Stable identifier of the card number across tokens.
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// Issuing country.
    #[serde(default)]
    pub country: Option<String>,
    /// Billing city.
    #[serde(default)]
    pub city: Option<String>,
    /// Billing postal code.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Whether the security code was verified.
    #[serde(default)]
    pub security_code_check: bool,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Card {
    /// Returns true if the card expired before the given month.
    #[must_use]
    pub fn is_expired_at(&self, year: u16, month: u8) -> bool {
        (self.expiration_year, self.expiration_month) < (year, month)
    }
}

/// Parameters of [`Cards::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateCard {
    /// New card holder name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New expiration month.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_month: Option<u8>,
    /// New expiration year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_year: Option<u16>,
    /// Billing city; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub city: Nullable<String>,
    /// Billing postal code; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub postal_code: Nullable<String>,
}

impl UpdateCard {
    fn validate(&self) -> Result<()> {
        if let Some(month) = self.expiration_month
            && !(1..=12).contains(&month)
        {
            return Err(PaygateError::InvalidInput(format!(
                "expiration_month must be between 1 and 12, got {month}"
            )));
        }
        Ok(())
    }
}

/// Cards service. Cards are addressed through their customer.
#[derive(Debug)]
pub struct Cards<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Cards<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    fn path(customer_id: &str, card_id: &str) -> Result<String> {
        let customer = path_id("customer id", customer_id)?;
        let card = path_id("card id", card_id)?;
        Ok(format!("/customers/{customer}/cards/{card}"))
    }

    /// Retrieves a saved card.
    ///
    /// # Errors
    ///
    /// Returns error if either id is empty or the request fails.
    pub async fn retrieve(&self, customer_id: &str, card_id: &str) -> Result<Card> {
        self.client.get(&Self::path(customer_id, card_id)?).await
    }

    /// Updates a saved card.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] for empty ids or an
    /// expiration month outside 1..=12.
    pub async fn update(&self, customer_id: &str, card_id: &str, params: &UpdateCard) -> Result<Card> {
        let path = Self::path(customer_id, card_id)?;
        params.validate()?;
        self.client.patch(&path, params).await
    }

    /// Removes a card from its customer.
    ///
    /// # Errors
    ///
    /// Returns error if either id is empty or the request fails.
    pub async fn delete(&self, customer_id: &str, card_id: &str) -> Result<Deleted> {
        self.client.delete(&Self::path(customer_id, card_id)?).await
    }

    /// Lists one page of a customer's cards.
    ///
    /// # Errors
    ///
    /// Returns error if the customer id is empty, the parameters are invalid
    /// or the request fails.
    pub async fn list(&self, customer_id: &str, params: &ListParams) -> Result<Pageable<Card>> {
        let customer = path_id("customer id", customer_id)?;
        self.client.list(&format!("/customers/{customer}/cards"), params).await
    }

    /// Walks all cards of a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the customer id is empty.
    pub fn list_all(&self, customer_id: &str, params: ListParams) -> Result<Paginator<'a, Card, T>> {
        let customer = path_id("customer id", customer_id)?;
        Ok(Paginator::new(self.client, format!("/customers/{customer}/cards"), params))
    }
}
