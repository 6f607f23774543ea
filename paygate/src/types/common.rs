//! Small value types used by several resources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form key/value data attached to a resource.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Confirmation returned by delete endpoints.
///
/// ```json
/// {"object": "customer", "id": "cust_test_1", "deleted": true}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    /// Object type of the deleted resource.
    pub object: String,
    /// Id of the deleted resource.
    pub id: String,
    /// Always true on success.
    #[serde(default)]
    pub deleted: bool,
    /// Whether the resource belonged to live mode.
    #[serde(default)]
    pub livemode: bool,
}

/// Postal address of a customer, card holder or recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street address, first line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    /// Street address, second line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    /// City or locality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State, province or region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal or ZIP code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Two-letter ISO 3166 country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}
