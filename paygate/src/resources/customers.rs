//! Customers and their saved payment details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::{cards::Card, path_id},
    transport::{HttpTransport, Transport},
    types::{Deleted, ListParams, Metadata, Nullable, Pageable, Paginator},
};

/// A customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Always `"customer"`.
    pub object: String,
    /// Customer id (`cust_...`).
    pub id: String,
    /// Whether the customer belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// API path of this customer.
    #[serde(default)]
    pub location: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Id of the card charged when none is specified.
    #[serde(default)]
    pub default_card: Option<String>,
    /// First page of saved cards.
    #[serde(default)]
    pub cards: Option<Pageable<Card>>,
    /// Merchant key-value data.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// Parameters of [`Customers::create`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateCustomer {
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Card token to save on the customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    /// Merchant key-value data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Parameters of [`Customers::update`].
///
/// ```
/// use paygate::{resources::customers::UpdateCustomer, types::Nullable};
///
/// // Change the email, drop the description, leave everything else alone.
/// let params = UpdateCustomer {
///     email: Nullable::Value("new@example.com".to_owned()),
///     description: Nullable::Null,
///     ..Default::default()
/// };
/// assert_eq!(
///     serde_json::to_string(&params).unwrap(),
///     r#"{"email":"new@example.com","description":null}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateCustomer {
    /// Contact email; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub email: Nullable<String>,
    /// Description; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub description: Nullable<String>,
    /// Id of a saved card to become the default; `Null` unsets it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub default_card: Nullable<String>,
    /// Card token to attach.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    /// Metadata; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub metadata: Nullable<Metadata>,
}

fn validate_email(email: Option<&String>) -> Result<()> {
    match email {
        Some(email) if !email.contains('@') => {
            Err(PaygateError::InvalidInput(format!("invalid email address: {email}")))
        }
        _ => Ok(()),
    }
}

/// Customers service.
#[derive(Debug)]
pub struct Customers<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Customers<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Creates a customer.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] for an email without `@`.
    #[instrument(skip(self, params))]
    pub async fn create(&self, params: &CreateCustomer) -> Result<Customer> {
        validate_email(params.email.as_ref())?;
        self.client.post("/customers", params, None).await
    }

    /// Retrieves a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Customer> {
        let id = path_id("customer id", id)?;
        self.client.get(&format!("/customers/{id}")).await
    }

    /// Updates a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty, the email is malformed or the
    /// request fails.
    pub async fn update(&self, id: &str, params: &UpdateCustomer) -> Result<Customer> {
        let id = path_id("customer id", id)?;
        validate_email(params.email.as_value())?;
        self.client.patch(&format!("/customers/{id}"), params).await
    }

    /// Deletes a customer and its saved cards.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Deleted> {
        let id = path_id("customer id", id)?;
        self.client.delete(&format!("/customers/{id}")).await
    }

    /// Lists one page of customers.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<Customer>> {
        self.client.list("/customers", params).await
    }

    /// Walks all customers matching `params`.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, Customer, T> {
        Paginator::new(self.client, "/customers".to_owned(), params)
    }
}
