//! Backend contract consumed by the console

use async_trait::async_trait;
use nightdesk_core::{RecordId, Resource, Result};
use std::fmt::Display;
use std::sync::Arc;

/// Conventional list/create/update/delete operations for one resource
///
/// Write operations return the authoritative record as stored by the backend.
/// Implementations never retry.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    /// Fetch the collection, optionally narrowed by `filter`
    async fn list(&self, filter: &ListFilter) -> Result<Vec<R>>;

    /// Create a record; the backend assigns the identifier
    async fn create(&self, payload: &R::Insert) -> Result<R>;

    /// Apply a partial update to an existing record
    async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R>;

    /// Remove a record
    async fn delete(&self, id: RecordId) -> Result<()>;
}

/// Shared handle to a backend for one resource
pub type SharedApi<R> = Arc<dyn ResourceApi<R>>;

/// Query parameters narrowing a list call, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    params: Vec<(String, String)>,
}

impl ListFilter {
    /// Empty filter: the whole collection
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Restrict to records belonging to an event
    #[must_use]
    pub fn event(self, event_id: RecordId) -> Self {
        self.param("event_id", event_id)
    }

    /// Restrict to a status
    #[must_use]
    pub fn status(self, status: impl Display) -> Self {
        self.param("status", status)
    }

    /// Add an arbitrary parameter, replacing an earlier value for the same key
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Display) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Value of a parameter, if set
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no parameter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encoded query string without the leading `?`
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
