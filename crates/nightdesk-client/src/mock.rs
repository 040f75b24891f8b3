//! In-memory backend for tests and offline demos

use crate::resource_api::{ListFilter, ResourceApi};
use async_trait::async_trait;
use nightdesk_core::{Error, RecordId, Resource, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Backend operation, used for failure injection and the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list`
    List,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

struct ScriptedList<R> {
    delay: Duration,
    result: Result<Vec<R>>,
}

struct MockState<R> {
    records: Vec<R>,
    next_id: RecordId,
    offline: bool,
    failures: HashMap<Operation, VecDeque<Error>>,
    scripted: VecDeque<ScriptedList<R>>,
    calls: Vec<(Operation, Option<RecordId>)>,
}

/// In-memory implementation of [`ResourceApi`]
///
/// Clones share the same backing collection, so a test can keep a handle
/// while the console owns another.
#[derive(Clone)]
pub struct MockApi<R> {
    state: Arc<Mutex<MockState<R>>>,
    latency: Duration,
}

impl<R: Resource> MockApi<R> {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a backend seeded with records; new ids continue after the
    /// largest seeded id
    #[must_use]
    pub fn with_records(records: Vec<R>) -> Self {
        let next_id = records.iter().map(Resource::id).max().unwrap_or(0) + 1;
        Self {
            state: Arc::new(Mutex::new(MockState {
                records,
                next_id,
                offline: false,
                failures: HashMap::new(),
                scripted: VecDeque::new(),
                calls: Vec::new(),
            })),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next call of `operation` fail with `error`
    ///
    /// Several failures for the same operation are consumed in order.
    pub fn fail_next(&self, operation: Operation, error: Error) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Make every call fail as if the server were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Queue a canned answer for a future `list` call, delivered after `delay`
    ///
    /// Scripted answers take precedence over the stored collection and are
    /// consumed in order.
    pub fn push_list_response(&self, delay: Duration, result: Result<Vec<R>>) {
        self.state
            .lock()
            .scripted
            .push_back(ScriptedList { delay, result });
    }

    /// Add or replace a record behind the console's back
    pub fn put_record(&self, record: R) {
        let mut state = self.state.lock();
        let id = record.id();
        state.next_id = state.next_id.max(id + 1);
        match state.records.iter_mut().find(|r| r.id() == id) {
            Some(slot) => *slot = record,
            None => state.records.push(record),
        }
    }

    /// Snapshot of the stored collection
    #[must_use]
    pub fn records(&self) -> Vec<R> {
        self.state.lock().records.clone()
    }

    /// Operations received so far, in arrival order
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.state.lock().calls.iter().map(|(op, _)| *op).collect()
    }

    /// Number of calls received for one operation
    #[must_use]
    pub fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    /// Record the call and pop an injected failure, if any
    fn enter(&self, operation: Operation, id: Option<RecordId>) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push((operation, id));
        if state.offline {
            return Err(Error::Transport("mock backend is offline".to_string()));
        }
        match state
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
    }

    fn not_found(id: RecordId) -> Error {
        Error::NotFound {
            resource: format!("{} {id}", R::LABEL),
        }
    }
}

impl<R: Resource> Default for MockApi<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for MockApi<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockApi")
            .field("records", &state.records.len())
            .field("next_id", &state.next_id)
            .field("offline", &state.offline)
            .field("calls", &state.calls.len())
            .field("latency", &self.latency)
            .finish()
    }
}

/// Whether the JSON form of `record` carries every filter parameter
fn matches_filter<R: Resource>(record: &R, filter: &ListFilter) -> bool {
    if filter.is_empty() {
        return true;
    }
    let Ok(value) = serde_json::to_value(record) else {
        return false;
    };
    filter.iter().all(|(key, expected)| match value.get(key) {
        Some(serde_json::Value::String(s)) => s == expected,
        Some(serde_json::Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    })
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for MockApi<R> {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<R>> {
        self.enter(Operation::List, None)?;

        let scripted = self.state.lock().scripted.pop_front();
        if let Some(ScriptedList { delay, result }) = scripted {
            sleep(delay).await;
            return result;
        }

        self.pause().await;
        let state = self.state.lock();
        Ok(state
            .records
            .iter()
            .filter(|r| matches_filter(*r, filter))
            .cloned()
            .collect())
    }

    async fn create(&self, payload: &R::Insert) -> Result<R> {
        self.enter(Operation::Create, None)?;
        self.pause().await;

        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let record = R::from_insert(id, payload);
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R> {
        self.enter(Operation::Update, Some(id))?;
        self.pause().await;

        let mut state = self.state.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.apply_patch(patch);
        Ok(record.clone())
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.enter(Operation::Delete, Some(id))?;
        self.pause().await;

        let mut state = self.state.lock();
        let index = state
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        state.records.remove(index);
        Ok(())
    }
}
