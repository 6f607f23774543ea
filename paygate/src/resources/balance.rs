//! Account balance.

use serde::{Deserialize, Serialize};

use crate::{
    client::Client,
    error::Result,
    transport::{HttpTransport, Transport},
};

/// Funds held by the gateway for the account, in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Always `"balance"`.
    pub object: String,
    /// Whether this is the live-mode balance.
    #[serde(default)]
    pub livemode: bool,
    /// API path.
    #[serde(default)]
    pub location: Option<String>,
    /// Settlement currency.
    pub currency: String,
    /// Everything held, including pending funds.
    pub total: i64,
    /// Funds that can be transferred now.
    pub available: i64,
    /// Funds held back against disputes.
    #[serde(default)]
    pub reserve: i64,
}

impl Balance {
    /// Funds that are neither available nor reserved yet.
    #[must_use]
    pub const fn pending(&self) -> i64 {
        self.total - self.available - self.reserve
    }
}

/// Balance service.
#[derive(Debug)]
pub struct BalanceService<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> BalanceService<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Retrieves the current balance.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn retrieve(&self) -> Result<Balance> {
        self.client.get("/balance").await
    }
}
