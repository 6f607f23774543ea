//! Payouts from the account balance to a recipient's bank account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    client::Client,
    error::Result,
    resources::{path_id, validate_amount},
    transport::{HttpTransport, Transport},
    types::{Deleted, ListParams, Metadata, Nullable, Pageable, Paginator},
};

/// A transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Always `"transfer"`.
    pub object: String,
    /// Transfer id (`trsf_...`).
    pub id: String,
    /// Whether the transfer belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Recipient id; the account's default recipient when omitted on create.
    #[serde(default)]
    pub recipient: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    /// ISO 4217 currency.
    pub currency: String,
    /// Fee deducted by the gateway.
    #[serde(default)]
    pub fee: i64,
    /// Sent to the bank.
    #[serde(default)]
    pub sent: bool,
    /// Confirmed as paid out.
    #[serde(default)]
    pub paid: bool,
    /// Machine-readable failure reason.
    #[serde(default)]
    pub failure_code: Option<String>,
    /// Human-readable failure reason.
    #[serde(default)]
    pub failure_message: Option<String>,
    /// Merchant key-value data.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Transfer {
    /// True when the transfer failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failure_code.is_some()
    }
}

/// Parameters of [`Transfers::create`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateTransfer {
    /// Amount in minor units of the account currency.
    pub amount: i64,
    /// Recipient id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// Merchant key-value data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CreateTransfer {
    /// Transfer of `amount` to the default recipient.
    #[must_use]
    pub fn new(amount: i64) -> Self {
        Self { amount, ..Self::default() }
    }

    /// Sets the recipient.
    #[must_use]
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        if let Some(recipient) = &self.recipient {
            path_id("recipient id", recipient)?;
        }
        Ok(())
    }
}

/// Parameters of [`Transfers::update`]. Only pending transfers can change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateTransfer {
    /// New amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// Metadata; `Null` clears it.
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub metadata: Nullable<Metadata>,
}

/// Transfers service.
#[derive(Debug)]
pub struct Transfers<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Transfers<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Creates a transfer.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`](crate::PaygateError::InvalidInput)
    /// for a non-positive amount or an empty recipient id.
    #[instrument(skip(self, params), fields(amount = params.amount))]
    pub async fn create(&self, params: &CreateTransfer) -> Result<Transfer> {
        params.validate()?;
        self.client.post("/transfers", params, None).await
    }

    /// Creates a transfer with a caller-chosen idempotency key.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub async fn create_with_idempotency_key(
        &self,
        params: &CreateTransfer,
        idempotency_key: &str,
    ) -> Result<Transfer> {
        params.validate()?;
        self.client.post("/transfers", params, Some(idempotency_key)).await
    }

    /// Retrieves a transfer.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Transfer> {
        let id = path_id("transfer id", id)?;
        self.client.get(&format!("/transfers/{id}")).await
    }

    /// Updates a pending transfer.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty, the new amount is not positive or
    /// the request fails.
    pub async fn update(&self, id: &str, params: &UpdateTransfer) -> Result<Transfer> {
        let id = path_id("transfer id", id)?;
        if let Some(amount) = params.amount {
            validate_amount(amount)?;
        }
        self.client.patch(&format!("/transfers/{id}"), params).await
    }

    /// Deletes a transfer that has not been sent.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Deleted> {
        let id = path_id("transfer id", id)?;
        self.client.delete(&format!("/transfers/{id}")).await
    }

    /// Lists one page of transfers.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<Transfer>> {
        self.client.list("/transfers", params).await
    }

    /// Walks all transfers.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, Transfer, T> {
        Paginator::new(self.client, "/transfers".to_owned(), params)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{PaygateError, client::testing::mock_client, transport::Method};

    fn transfer_json() -> Value {
        json!({
            "object": "transfer",
            "id": "trsf_test_1",
            "recipient": "recp_test_1",
            "amount": 50_000,
            "currency": "thb",
            "fee": 3_000,
            "sent": false,
            "paid": false,
            "created": "2024-06-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_create_transfer() {
        let client = mock_client();
        client.transport().push_json(200, &transfer_json());

        let transfer = client
            .transfers()
            .create_with_idempotency_key(&CreateTransfer::new(50_000).recipient("recp_test_1"), "payout-7")
            .await
            .unwrap();
        assert_eq!(transfer.fee, 3_000);
        assert!(!transfer.is_failed());

        let request = client.transport().last_request();
        assert_eq!(request.header("idempotency-key"), Some("payout-7"));
        assert_eq!(request.body, Some(json!({"amount": 50_000, "recipient": "recp_test_1"})));
    }

    #[tokio::test]
    async fn test_create_transfer_validation() {
        let client = mock_client();
        let transfers = client.transfers();
        assert!(matches!(transfers.create(&CreateTransfer::new(0)).await, Err(PaygateError::InvalidInput(_))));
        assert!(transfers.create(&CreateTransfer::new(10).recipient("")).await.is_err());

        let params = UpdateTransfer { amount: Some(-1), ..Default::default() };
        assert!(transfers.update("trsf_test_1", &params).await.is_err());
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_transfer() {
        let client = mock_client();
        let mut body = transfer_json();
        body["failure_code"] = json!("insufficient_balance");
        body["failure_message"] = json!("balance is too low");
        client.transport().push_json(200, &body);

        let transfer = client.transfers().retrieve("trsf_test_1").await.unwrap();
        assert!(transfer.is_failed());
        assert_eq!(transfer.failure_message.as_deref(), Some("balance is too low"));
    }

    #[tokio::test]
    async fn test_delete_transfer() {
        let client = mock_client();
        client.transport().push_json(200, &json!({"object": "transfer", "id": "trsf_test_1", "deleted": true}));

        let deleted = client.transfers().delete("trsf_test_1").await.unwrap();
        assert!(deleted.deleted);
        assert_eq!(client.transport().last_request().method, Method::Delete);
    }
}
