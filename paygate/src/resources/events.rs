//! Account events, also delivered to webhook endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    client::Client,
    error::{PaygateError, Result},
    resources::path_id,
    transport::{HttpTransport, Transport},
    types::{ListParams, Pageable, Paginator},
};

/// Something that happened on the account, such as `charge.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Always `"event"`.
    pub object: String,
    /// Event id (`evnt_...`).
    pub id: String,
    /// Whether the event belongs to live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Event type, `<resource>.<action>`.
    pub key: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Snapshot of the affected resource.
    #[serde(default)]
    pub data: Value,
}

impl Event {
    /// Deserializes [`data`](Self::data) into a concrete resource.
    ///
    /// ```
    /// # use paygate::resources::{charges::Charge, events::Event};
    /// # fn handle(event: &Event) -> paygate::error::Result<()> {
    /// if event.key.starts_with("charge.") {
    ///     let charge: Charge = event.data_as()?;
    ///     println!("{} changed", charge.id);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Decode`] if the data has another shape.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.data)
            .map_err(|e| PaygateError::Decode(format!("event {} ({}) data: {e}", self.id, self.key)))
    }

    /// Resource part of the key: `charge` for `charge.create`.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.key.split_once('.').map_or(self.key.as_str(), |(resource, _)| resource)
    }
}

/// Events service.
#[derive(Debug)]
pub struct Events<'a, T: Transport = HttpTransport> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> Events<'a, T> {
    pub(crate) const fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Retrieves an event.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or the request fails.
    pub async fn retrieve(&self, id: &str) -> Result<Event> {
        let id = path_id("event id", id)?;
        self.client.get(&format!("/events/{id}")).await
    }

    /// Lists one page of events.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the request fails.
    pub async fn list(&self, params: &ListParams) -> Result<Pageable<Event>> {
        self.client.list("/events", params).await
    }

    /// Walks all events.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> Paginator<'a, Event, T> {
        Paginator::new(self.client, "/events".to_owned(), params)
    }
}
