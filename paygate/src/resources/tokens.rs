//! Card tokenization with the public key.
//!
//! Servers normally receive tokens created in the browser; creating them
//! server-side is supported for testing and for trusted environments.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::{cards::Card, path_id},
    transport::{HttpTransport, Transport},
};

/// A single-use card token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Always `"token"`.
    pub object: String,
    /// Token id (`tokn_...`).
    pub id: String,
    /// Whether the token belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// True once the token was consumed by a charge or customer.
    #[serde(default)]
    pub used: bool,
    /// The tokenized card.
    pub card: Card,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// Raw card details to tokenize.
///
/// `Debug` masks the number and the security code. Both are wiped from
/// memory on drop.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardDetails {
    /// Card holder name.
    pub name: String,
    /// Primary account number, digits only.
    pub number: Zeroizing<String>,
    /// Expiration month, 1..=12.
    pub expiration_month: u8,
    /// Four-digit expiration year.
    pub expiration_year: u16,
    /// CVV/CVC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_code: Option<Zeroizing<String>>,
    /// Billing city.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Billing postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl CardDetails {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PaygateError::InvalidInput("card name must not be empty".to_owned()));
        }
        if !(12..=19).contains(&self.number.len())
            || !self.number.bytes().all(|b| b.is_ascii_digit())
            || !luhn_valid(&self.number)
        {
            return Err(PaygateError::InvalidInput("card number is invalid".to_owned()));
        }
        if !(1..=12).contains(&self.expiration_month) {
            return Err(PaygateError::InvalidInput(format!(
                "expiration_month must be between 1 and 12, got {}",
                self.expiration_month
            )));
        }
        if self.expiration_year < 1000 {
            return Err(PaygateError::InvalidInput(
                "expiration_year must have four digits".to_owned(),
            ));
        }
        if let Some(code) = &self.security_code
            && (!(3..=4).contains(&code.len()) || !code.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(PaygateError::InvalidInput("security code is invalid".to_owned()));
        }
        Ok(())
    }

    /// Last four digits of the number.
    fn last_digits(&self) -> &str {
        self.number.get(self.number.len().saturating_sub(4)..).unwrap_or_default()
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("name", &self.name)
            .field("number", &format_args!("****{}", self.last_digits()))
            .field("expiration_month", &self.expiration_month)
            .field("expiration_year", &self.expiration_year)
            .field("security_code", &self.security_code.as_ref().map(|_| "***"))
            .field("city", &self.city)
            .field("postal_code", &self.postal_code)
            .finish()
    }
}

fn luhn_valid(number: &str) -> bool {
    let sum: u32 = number
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, d)| if i % 2 == 1 { if d * 2 > 9 { d * 2 - 9 } else { d * 2 } } else { d })
        .sum();
    sum % 10 == 0
}

#[derive(Serialize)]
struct CreateTokenBody<'a> {
    card: &'a CardDetails,
}

/// Tokens service. Authenticates with the public key.
#[derive(Debug)]
pub struct Tokens<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Tokens<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Tokenizes a card.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] for malformed card details and
    /// [`PaygateError::Config`] when the client has no public key.
    pub async fn create(&self, card: &CardDetails) -> Result<Token> {
        card.validate()?;
        self.client.post_public("/tokens", &CreateTokenBody { card }).await
    }

    /// Retrieves a token.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty, the client has no public key or the
    /// request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Token> {
        let id = path_id("token id", id)?;
        self.client.get_public(&format!("/tokens/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{auth::AuthScheme, client::testing::mock_client, resources::cards::tests::card_json};

    fn visa() -> CardDetails {
        CardDetails {
            name: "Somchai Prasert".to_owned(),
            number: "4242424242424242".to_owned().into(),
            expiration_month: 10,
            expiration_year: 2030,
            security_code: Some("123".to_owned().into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4242424242424242"));
        assert!(luhn_valid("5555555555554444"));
        assert!(!luhn_valid("4242424242424241"));
    }

    #[test]
    fn test_card_details_validation() {
        assert!(visa().validate().is_ok());

        let cases = [
            CardDetails { number: "4242 4242 4242 4242".to_owned().into(), ..visa() },
            CardDetails { number: "4242424242424241".to_owned().into(), ..visa() },
            CardDetails { number: "4242".to_owned().into(), ..visa() },
            CardDetails { expiration_month: 0, ..visa() },
            CardDetails { expiration_year: 30, ..visa() },
            CardDetails { security_code: Some("12a".to_owned().into()), ..visa() },
            CardDetails { name: " ".to_owned(), ..visa() },
        ];
        for case in &cases {
            assert!(case.validate().is_err(), "accepted {case:?}");
        }
    }

    #[test]
    fn test_card_details_debug_masks_secrets() {
        let debug = format!("{:?}", visa());
        assert!(debug.contains("****4242"));
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("123"));
    }

    #[test]
    fn test_card_details_secrets_zeroize() {
        use zeroize::Zeroize;

        let mut card = visa();
        assert_eq!(
            serde_json::to_value(&card).unwrap(),
            json!({
                "name": "Somchai Prasert",
                "number": "4242424242424242",
                "expiration_month": 10,
                "expiration_year": 2030,
                "security_code": "123"
            })
        );

        card.number.zeroize();
        if let Some(code) = card.security_code.as_mut() {
            code.zeroize();
        }
        assert!(card.number.is_empty());
        assert_eq!(card.security_code.as_deref().map(String::as_str), Some(""));
    }

    #[tokio::test]
    async fn test_create_token_uses_public_key() {
        let client = mock_client();
        client.transport().push_json(
            200,
            &json!({
                "object": "token",
                "id": "tokn_test_1",
                "used": false,
                "card": card_json("card_test_1"),
                "created": "2024-06-01T00:00:00Z"
            }),
        );

        let token = client.tokens().create(&visa()).await.unwrap();
        assert_eq!(token.id, "tokn_test_1");
        assert!(!token.used);

        let request = client.transport().last_request();
        assert_eq!(request.path, "/v1/tokens");
        assert_eq!(request.body.as_ref().unwrap()["card"]["number"], "4242424242424242");
        let public = crate::auth::ApiKey::new("pkey_test_456").unwrap();
        assert_eq!(request.authorization, public.authorization(AuthScheme::Basic));
    }

    #[tokio::test]
    async fn test_invalid_card_never_sent() {
        let client = mock_client();
        let card = CardDetails { number: "1234567890123".to_owned().into(), ..visa() };
        assert!(matches!(client.tokens().create(&card).await, Err(PaygateError::InvalidInput(_))));
        assert!(client.transport().requests().is_empty());
    }
}
