//! Paygate: typed async client for the Paygate payment gateway REST API.
//!
//! One typed service per gateway resource covers charges, refunds,
//! customers, cards, tokens, plans, subscriptions, transfers, recipients,
//! events, webhook endpoints, balance and account. Every call goes through
//! a single request pipeline that authenticates, retries and maps failures
//! into [`PaygateError`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Your service    │
//! └────────┬─────────┘
//!          │ client.charges().create(..)
//! ┌────────▼──────────────────────────────────────┐
//! │              paygate (this crate)             │
//! │  ┌────────────┐   ┌──────────┐   ┌─────────┐  │
//! │  │ resources  │──▶│  client  │──▶│transport│  │
//! │  │ (typed     │   │ (retry,  │   │ (auth,  │  │
//! │  │  services) │   │  errors) │   │  HTTPS) │  │
//! │  └────────────┘   └──────────┘   └─────────┘  │
//! └────────┬──────────────────────────────────────┘
//!          │ HTTPS + Basic/Bearer auth
//! ┌────────▼─────────┐
//! │  Paygate API     │  https://api.paygate.dev/v1
//! └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use paygate::{Client, resources::charges::CreateCharge};
//!
//! # async fn example() -> paygate::Result<()> {
//! // Reads PAYGATE_SECRET_KEY and, if set, PAYGATE_PUBLIC_KEY.
//! let client = Client::from_env()?;
//!
//! let charge = client
//!     .charges()
//!     .create(&CreateCharge::new(10_000, "thb").card("tokn_test_5g5mep"))
//!     .await?;
//! println!("{} {:?}", charge.id, charge.status);
//! # Ok(())
//! # }
//! ```
//!
//! # Pagination
//!
//! List endpoints are offset based. [`Pageable`] is one page;
//! [`Paginator`](types::Paginator) walks all of them:
//!
//! ```rust,no_run
//! use paygate::{Client, ListParams};
//!
//! # async fn example(client: &Client) -> paygate::Result<()> {
//! let mut pages = client.customers().list_all(ListParams::new().limit(100));
//! while let Some(page) = pages.next_page().await? {
//!     for customer in &page {
//!         println!("{}", customer.id);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Updating and clearing fields
//!
//! Update parameters distinguish "leave unchanged" from "clear" with
//! [`Nullable`]: `Absent` is omitted from the request, `Null` is sent as
//! JSON `null`, `Value(v)` sets the field.
//!
//! # Error Handling
//!
//! ```rust,no_run
//! use paygate::{Client, PaygateError, resources::charges::CreateCharge};
//!
//! # async fn example(client: &Client) {
//! match client.charges().create(&CreateCharge::new(10_000, "thb").card("tokn_x")).await {
//!     Ok(charge) => println!("charged {}", charge.id),
//!     Err(PaygateError::Api(err)) if err.code == "invalid_card" => {
//!         eprintln!("declined: {}", err.message);
//!     }
//!     Err(PaygateError::Api(err)) => eprintln!("gateway refused: {err}"),
//!     Err(err) if err.is_transport() => eprintln!("network problem: {err}"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`client`]: [`Client`], its builder and the request pipeline
//! - [`resources`]: one service per gateway resource
//! - [`types`]: pagination, [`Nullable`], metadata and money helpers
//! - [`auth`]: API keys and credentials
//! - [`config`]: TOML client configuration
//! - [`transport`]: sealed transport abstraction over HTTPS
//! - [`reliability`]: retry with exponential backoff
//! - [`webhook`]: webhook signature verification
//! - [`error`]: error types
//!
//! # Security Considerations
//!
//! - Keys are never logged; `Debug` output of keys and card details is masked.
//! - Plain HTTP and loopback hosts are rejected unless
//!   [`ClientBuilder::allow_insecure_http`] is set for a local mock server.
//! - Ids are percent-encoded into paths; `..` is rejected.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and wiremock"
)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod reliability;
pub mod resources;
pub mod transport;
pub mod types;
pub mod webhook;

pub use auth::{ApiKey, AuthScheme, Credentials};
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::{ApiError, PaygateError, Result};
pub use types::{ListParams, Nullable, Pageable};
pub use webhook::WebhookVerifier;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<PaygateError>;
        let _ = std::marker::PhantomData::<Client>;
    }
}
