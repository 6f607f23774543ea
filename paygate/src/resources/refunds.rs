//! Refunds of captured charges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    client::Client,
    error::Result,
    resources::{path_id, validate_amount},
    transport::{HttpTransport, Transport},
    types::{ListParams, Metadata, Pageable, Paginator},
};

/// A full or partial refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    /// Always `"refund"`.
    pub object: String,
    /// Refund id (`rfnd_...`).
    pub id: String,
    /// Whether the refund was made with live keys.
    #[serde(default)]
    pub livemode: bool,
    /// Refunded amount in minor units.
    pub amount: i64,
    /// Currency of the refunded charge.
    pub currency: String,
    /// Id of the refunded charge.
    pub charge: String,
    /// Id of the balance transaction.
    #[serde(default)]
    pub transaction: Option<String>,
    /// True when the refund voided the charge before settlement.
    #[serde(default)]
    pub voided: bool,
    /// Merchant key-value data.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// Parameters of [`Refunds::create`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateRefund {
    /// Amount to refund in minor units; at most the refundable amount.
    pub amount: i64,
    /// Merchant key-value data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CreateRefund {
    /// Refunds `amount` minor units.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self { amount, metadata: None }
    }
}

/// Refunds service. Refunds are addressed through their charge.
#[derive(Debug)]
pub struct Refunds<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Refunds<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Refunds part or all of a charge.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`](crate::PaygateError::InvalidInput)
    /// for an empty charge id or a non-positive amount.
    #[instrument(skip(self, params), fields(amount = params.amount))]
    pub async fn create(&self, charge_id: &str, params: &CreateRefund) -> Result<Refund> {
        let charge = path_id("charge id", charge_id)?;
        validate_amount(params.amount)?;
        self.client.post(&format!("/charges/{charge}/refunds"), params, None).await
    }

    /// Refunds with a caller-chosen idempotency key.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub async fn create_with_idempotency_key(
        &self,
        charge_id: &str,
        params: &CreateRefund,
        idempotency_key: &str,
    ) -> Result<Refund> {
        let charge = path_id("charge id", charge_id)?;
        validate_amount(params.amount)?;
        self.client.post(&format!("/charges/{charge}/refunds"), params, Some(idempotency_key)).await
    }

    /// Retrieves one refund of a charge.
    ///
    /// # Errors
    ///
    /// Returns error if either id is empty or the request fails.
    pub async fn retrieve(&self, charge_id: &str, refund_id: &str) -> Result<Refund> {
        let charge = path_id("charge id", charge_id)?;
        let refund = path_id("refund id", refund_id)?;
        self.client.get(&format!("/charges/{charge}/refunds/{refund}")).await
    }

    /// Lists one page of the refunds of a charge.
    ///
    /// # Errors
    ///
    /// Returns error if the charge id is empty, the parameters are invalid
    /// or the request fails.
    pub async fn list(&self, charge_id: &str, params: &ListParams) -> Result<Pageable<Refund>> {
        let charge = path_id("charge id", charge_id)?;
        self.client.list(&format!("/charges/{charge}/refunds"), params).await
    }

    /// Walks all refunds of a charge.
    ///
    /// # Errors
    ///
    /// Returns error if the charge id is empty.
    pub fn list_all(&self, charge_id: &str, params: ListParams) -> Result<Paginator<'a, Refund, T>> {
        let charge = path_id("charge id", charge_id)?;
        Ok(Paginator::new(self.client, format!("/charges/{charge}/refunds"), params))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{PaygateError, client::testing::mock_client};

    fn refund_json(id: &str, amount: i64) -> Value {
        json!({
            "object": "refund",
            "id": id,
            "amount": amount,
            "currency": "thb",
            "charge": "chrg_test_1",
            "voided": false,
            "created": "2024-06-02T08:30:00Z"
        })
    }

    #[tokio::test]
    async fn test_create_refund() {
        let client = mock_client();
        client.transport().push_json(200, &refund_json("rfnd_test_1", 2_500));

        let refund = client.refunds().create("chrg_test_1", &CreateRefund::new(2_500)).await.unwrap();
        assert_eq!(refund.amount, 2_500);
        assert_eq!(refund.charge, "chrg_test_1");

        let request = client.transport().last_request();
        assert_eq!(request.path, "/v1/charges/chrg_test_1/refunds");
        assert_eq!(request.body, Some(json!({"amount": 2_500})));
        assert!(request.header("Idempotency-Key").is_some());
    }

    #[tokio::test]
    async fn test_create_refund_validation() {
        let client = mock_client();
        let refunds = client.refunds();

        assert!(matches!(
            refunds.create("", &CreateRefund::new(100)).await,
            Err(PaygateError::InvalidInput(_))
        ));
        assert!(matches!(
            refunds.create("chrg_1", &CreateRefund::new(0)).await,
            Err(PaygateError::InvalidInput(_))
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_refund_path() {
        let client = mock_client();
        client.transport().push_json(200, &refund_json("rfnd_test_1", 100));

        client.refunds().retrieve("chrg_test_1", "rfnd_test_1").await.unwrap();
        assert_eq!(client.transport().last_request().path, "/v1/charges/chrg_test_1/refunds/rfnd_test_1");
    }

    #[tokio::test]
    async fn test_list_all_refunds() {
        let client = mock_client();
        client.transport().push_json(
            200,
            &json!({"object": "list", "offset": 0, "limit": 1, "total": 2,
                    "data": [refund_json("rfnd_1", 100)]}),
        );
        client.transport().push_json(
            200,
            &json!({"object": "list", "offset": 1, "limit": 1, "total": 2,
                    "data": [refund_json("rfnd_2", 200)]}),
        );

        let refunds = client
            .refunds()
            .list_all("chrg_test_1", ListParams::new().limit(1))
            .unwrap()
            .collect_all()
            .await
            .unwrap();
        assert_eq!(refunds.iter().map(|r| r.amount).sum::<i64>(), 300);
        assert!(client.refunds().list_all("", ListParams::new()).is_err());
    }
}
