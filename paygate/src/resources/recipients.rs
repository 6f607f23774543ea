//! Transfer recipients and their bank accounts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::path_id,
    transport::{HttpTransport, Transport},
    types::{Deleted, ListParams, Metadata, Nullable, Pageable, Paginator},
};

/// Legal form of a recipient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    /// Natural person.
    #[default]
    Individual,
    /// Company.
    Corporation,
}

/// Bank account as returned by the gateway. The number is truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Bank code.
    pub brand: String,
    /// Last digits of the account number.
    pub last_digits: String,
    /// Account holder name.
    pub name: String,
}

/// A recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    /// Always `"recipient"`.
    pub object: String,
    /// Recipient id (`recp_...`).
    pub id: String,
    /// Whether the recipient belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Name of the person or company.
    pub name: String,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Legal form.
    #[serde(rename = "type")]
    pub kind: RecipientKind,
    /// Tax identification number.
    #[serde(default)]
    pub tax_id: Option<String>,
    /// Payout destination.
    #[serde(default)]
    pub bank_account: Option<BankAccount>,
    /// Verified by the gateway.
    #[serde(default)]
    pub verified: bool,
    /// Accepts transfers.
    #[serde(default)]
    pub active: bool,
    /// Merchant key-value data.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// Bank account to pay out to. `Debug` masks the account number.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct BankAccountParams {
    /// Bank code.
    pub brand: String,
    /// Full account number.
    pub number: String,
    /// Account holder name.
    pub name: String,
}

impl fmt::Debug for BankAccountParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = self.number.get(self.number.len().saturating_sub(4)..).unwrap_or_default();
        f.debug_struct("BankAccountParams")
            .field("brand", &self.brand)
            .field("number", &format_args!("****{tail}"))
            .field("name", &self.name)
            .finish()
    }
}

impl BankAccountParams {
    fn validate(&self) -> Result<()> {
        if self.brand.trim().is_empty() || self.name.trim().is_empty() {
            return Err(PaygateError::InvalidInput("bank account brand and name are required".to_owned()));
        }
        if self.number.is_empty() || !self.number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaygateError::InvalidInput("bank account number must be digits".to_owned()));
        }
        Ok(())
    }
}

/// Parameters of [`Recipients::create`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRecipient {
    /// Name of the person or company.
    pub name: String,
    /// Legal form.
    #[serde(rename = "type")]
    pub kind: RecipientKind,
    /// Payout destination.
    pub bank_account: BankAccountParams,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tax identification number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// Merchant key-value data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CreateRecipient {
    /// Individual recipient paid into `bank_account`.
    #[must_use]
    pub fn new(name: impl Into<String>, bank_account: BankAccountParams) -> Self {
        Self {
            name: name.into(),
            kind: RecipientKind::Individual,
            bank_account,
            email: None,
            description: None,
            tax_id: None,
            metadata: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PaygateError::InvalidInput("recipient name must not be empty".to_owned()));
        }
        self.bank_account.validate()
    }
}

/// Parameters of [`Recipients::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateRecipient {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New legal form.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecipientKind>,
    /// Replaces the bank account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<BankAccountParams>,
    /// Email; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub email: Nullable<String>,
    /// Description; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub description: Nullable<String>,
    /// Tax id; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub tax_id: Nullable<String>,
    /// Metadata; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub metadata: Nullable<Metadata>,
}

/// Recipients service.
#[derive(Debug)]
pub struct Recipients<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Recipients<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Creates a recipient.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] for an empty name or a
    /// malformed bank account.
    pub async fn create(&self, params: &CreateRecipient) -> Result<Recipient> {
        params.validate()?;
        self.client.post("/recipients", params, None).await
    }

    /// Retrieves a recipient.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Recipient> {
        let id = path_id("recipient id", id)?;
        self.client.get(&format!("/recipients/{id}")).await
    }

    /// Updates a recipient. Changing the bank account resets verification.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty, the bank account is malformed or
    /// the request fails.
    pub async fn update(&self, id: &str, params: &UpdateRecipient) -> Result<Recipient> {
        let id = path_id("recipient id", id)?;
        if let Some(bank_account) = &params.bank_account {
            bank_account.validate()?;
        }
        self.client.patch(&format!("/recipients/{id}"), params).await
    }

    /// Deletes a recipient.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn delete(&self, id: &str) -> Result<Deleted> {
        let id = path_id("recipient id", id)?;
        self.client.delete(&format!("/recipients/{id}")).await
    }

    /// Lists one page of recipients.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<Recipient>> {
        self.client.list("/recipients", params).await
    }

    /// Walks all recipients.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, Recipient, T> {
        Paginator::new(self.client, "/recipients".to_owned(), params)
    }
}
