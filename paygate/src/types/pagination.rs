//! Offset pagination for list endpoints.
//!
//! List endpoints take [`ListParams`] and answer with a [`Pageable`]
//! envelope carrying `offset`, `limit` and `total`. A [`Paginator`] walks
//! every page of one listing.
//!
//! # Examples
//!
//! ```rust,no_run
//! use paygate::{Client, auth::Credentials, types::{ListParams, Ordering}};
//!
//! # async fn example() -> paygate::error::Result<()> {
//! let client = Client::new(Credentials::new("skey_test_123")?)?;
//!
//! let params = ListParams::new().limit(50).order(Ordering::ReverseChronological);
//! let page = client.charges().list(&params).await?;
//! println!("{} of {} charges", page.len(), page.total);
//!
//! let everything = client.charges().list_all(ListParams::new()).collect_all().await?;
//! # let _ = everything;
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    client::Client,
    error::{PaygateError, Result},
    transport::{HttpTransport, Transport},
};

/// Largest page size accepted by the gateway.
pub const MAX_LIMIT: u32 = 100;

/// Page size used when none is requested.
pub const DEFAULT_LIMIT: u32 = 20;

/// Sort order of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordering {
    /// Oldest first.
    #[default]
    Chronological,
    /// Newest first.
    ReverseChronological,
}

impl Ordering {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chronological => "chronological",
            Self::ReverseChronological => "reverse_chronological",
        }
    }
}

/// Query parameters of a list call.
///
/// Unset fields are left to the gateway defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Number of items to skip.
    pub offset: Option<u64>,
    /// Page size, 1..=100.
    pub limit: Option<u32>,
    /// Sort order.
    pub order: Option<Ordering>,
    /// Only objects created at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only objects created before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl ListParams {
    /// Creates empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the offset.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn order(mut self, order: Ordering) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the lower creation bound.
    #[must_use]
    pub const fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the upper creation bound.
    #[must_use]
    pub const fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Checks the parameters before they are sent.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::InvalidInput`] if `limit` is outside 1..=100
    /// or `from` is after `to`.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            return Err(PaygateError::InvalidInput(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(PaygateError::InvalidInput("from must not be after to".to_owned()));
        }
        Ok(())
    }

    /// Encodes the set fields as query pairs.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(5);
        if let Some(offset) = self.offset {
            query.push(("offset".to_owned(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_owned(), limit.to_string()));
        }
        if let Some(order) = self.order {
            query.push(("order".to_owned(), order.as_str().to_owned()));
        }
        if let Some(from) = self.from {
            query.push(("from".to_owned(), from.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(to) = self.to {
            query.push(("to".to_owned(), to.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        query
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable<T> {
    /// Always `"list"`.
    #[serde(default = "list_object")]
    pub object: String,
    /// Offset of the first item in `data`.
    #[serde(default)]
    pub offset: u64,
    /// Page size the gateway applied.
    #[serde(default)]
    pub limit: u64,
    /// Number of items matching the query across all pages.
    #[serde(default)]
    pub total: u64,
    /// Sort order the gateway applied.
    #[serde(default)]
    pub order: Option<Ordering>,
    /// Path of the listed collection.
    #[serde(default)]
    pub location: Option<String>,
    /// Items of this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Pageable<T> {
    /// Offset of the next page, or `None` on the last page.
    ///
    /// An empty page is always the last one.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::types::Pageable;
    ///
    /// let page: Pageable<u32> = serde_json::from_value(serde_json::json!({
    ///     "object": "list", "offset": 0, "limit": 2, "total": 3, "data": [1, 2]
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(page.next_offset(), Some(2));
    /// assert!(page.has_more());
    /// ```
    #[must_use]
    pub fn next_offset(&self) -> Option<u64> {
        if self.data.is_empty() {
            return None;
        }
        let next = self.offset.saturating_add(self.data.len() as u64);
        (next < self.total).then_some(next)
    }

    /// Returns true if another page follows.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_offset().is_some()
    }

    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates the items of this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<T> IntoIterator for Pageable<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'p, T> IntoIterator for &'p Pageable<T> {
    type Item = &'p T;
    type IntoIter = std::slice::Iter<'p, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

fn list_object() -> String {
    "list".to_owned()
}

/// Walks every page of one list endpoint.
///
/// Created by the `list_all` method of each service. Pages are fetched
/// lazily, one request per [`next_page`](Self::next_page) call. Walking
/// stops after the page whose [`Pageable::next_offset`] is `None`.
#[derive(Debug)]
pub struct Paginator<'a, T, R: Transport = HttpTransport> {
    client: &'a Client<R>,
    path: String,
    params: ListParams,
    next_offset: Option<u64>,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T, R> Paginator<'a, T, R>
where
    T: DeserializeOwned,
    R: Transport,
{
    pub(crate) fn new(client: &'a Client<R>, path: String, params: ListParams) -> Self {
        let next_offset = Some(params.offset.unwrap_or(0));
        Self { client, path, params, next_offset, _item: PhantomData }
    }

    /// Fetches the next page, or returns `None` once the listing is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying list call. The paginator stays on
    /// the failed page, so calling again retries it.
    pub async fn next_page(&mut self) -> Result<Option<Pageable<T>>> {
        let Some(offset) = self.next_offset else {
            return Ok(None);
        };

        let params = self.params.clone().offset(offset);
        let page: Pageable<T> = self.client.list(&self.path, &params).await?;
        self.next_offset = page.next_offset();

        tracing::debug!(
            path = %self.path,
            offset,
            items = page.len(),
            total = page.total,
            "fetched page"
        );
        Ok(Some(page))
    }

    /// Fetches all remaining pages and concatenates their items.
    ///
    /// # Errors
    ///
    /// Returns the first error of any page request.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}
