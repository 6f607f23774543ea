//! Typed service clients, one per gateway resource.
//!
//! Each service borrows the [`Client`](crate::Client) it was created from
//! and maps its methods one-to-one onto gateway endpoints:
//!
//! | Service | Endpoints |
//! |---|---|
//! | [`Charges`] | `/charges[/{id}[/capture\|/reverse]]` |
//! | [`Refunds`] | `/charges/{id}/refunds[/{refund}]` |
//! | [`Customers`] | `/customers[/{id}]` |
//! | [`Cards`] | `/customers/{id}/cards[/{card}]` |
//! | [`Tokens`] | `/tokens[/{id}]` |
//! | [`Plans`] | `/plans[/{id}]` |
//! | [`Subscriptions`] | `/subscriptions[/{id}[/cancel\|/pause\|/resume]]` |
//! | [`Transfers`] | `/transfers[/{id}]` |
//! | [`Recipients`] | `/recipients[/{id}]` |
//! | [`Events`] | `/events[/{id}]` |
//! | [`WebhookEndpoints`] | `/webhook_endpoints[/{id}]` |
//! | [`BalanceService`] | `/balance` |
//! | [`AccountService`] | `/account` |

pub mod account;
pub mod balance;
pub mod cards;
pub mod charges;
pub mod customers;
pub mod events;
pub mod plans;
pub mod recipients;
pub mod refunds;
pub mod subscriptions;
pub mod tokens;
pub mod transfers;
pub mod webhook_endpoints;

pub use account::AccountService;
pub use balance::BalanceService;
pub use cards::Cards;
pub use charges::Charges;
pub use customers::Customers;
pub use events::Events;
pub use plans::Plans;
pub use recipients::Recipients;
pub use refunds::Refunds;
pub use subscriptions::Subscriptions;
pub use tokens::Tokens;
pub use transfers::Transfers;
pub use webhook_endpoints::WebhookEndpoints;

use url::form_urlencoded;

use crate::error::{PaygateError, Result};

/// Validates a resource id and percent-encodes it as one path segment.
pub(crate) fn path_id(name: &str, id: &str) -> Result<String> {
    if id.trim().is_empty() {
        return Err(PaygateError::InvalidInput(format!("{name} must not be empty")));
    }
    if id.contains("..") {
        return Err(PaygateError::InvalidInput(format!("{name} must not contain '..': {id}")));
    }
    Ok(form_urlencoded::byte_serialize(id.as_bytes()).collect::<String>().replace('+', "%20"))
}

/// Amounts are minor units and must be positive.
pub(crate) fn validate_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(PaygateError::InvalidInput(format!("amount must be positive, got {amount}")));
    }
    Ok(())
}

/// Currencies are three-letter ISO 4217 codes.
pub(crate) fn validate_currency(currency: &str) -> Result<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PaygateError::InvalidInput(format!(
            "currency must be a three-letter ISO code, got '{currency}'"
        )));
    }
    Ok(())
}

/// Body of action endpoints that take no parameters.
#[derive(Debug, serde::Serialize)]
pub(crate) struct Empty {}
