//! The merchant account the secret key belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    client::Client,
    error::Result,
    transport::{HttpTransport, Transport},
};

/// Merchant account settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Always `"account"`.
    pub object: String,
    /// Account id.
    pub id: String,
    /// Whether the key used is a live key.
    #[serde(default)]
    pub livemode: bool,
    /// Owner email.
    pub email: String,
    /// Default charge and settlement currency.
    pub currency: String,
    /// Currencies charges may be created in.
    #[serde(default)]
    pub supported_currencies: Vec<String>,
    /// URL receiving webhook deliveries, if configured on the dashboard.
    #[serde(default)]
    pub webhook_uri: Option<String>,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Account {
    /// Whether charges may be created in `currency`.
    #[must_use]
    pub fn supports_currency(&self, currency: &str) -> bool {
        currency.eq_ignore_ascii_case(&self.currency)
            || self.supported_currencies.iter().any(|c| c.eq_ignore_ascii_case(currency))
    }
}

/// Account service.
#[derive(Debug)]
pub struct AccountService<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> AccountService<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Retrieves the account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn retrieve(&self) -> Result<Account> {
        self.client.get("/account").await
    }
}
