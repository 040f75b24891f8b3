//! Local state container for one page
//!
//! The store performs no validation. Locks are held only for the duration of
//! a closure and never across an `.await`.

use crate::derived::Filters;
use crate::modal::ModalState;
use nightdesk_core::{RecordId, Resource};
use parking_lot::RwLock;
use std::sync::Arc;

/// Everything a collection page shows
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<R> {
    /// Records as last confirmed or optimistically edited
    pub items: Vec<R>,
    /// Active filters
    pub filters: Filters,
    /// Record the user picked, if any
    pub selection: Option<RecordId>,
    /// Create/edit modal
    pub modal: ModalState<R>,
    /// Current page, 1-based
    pub page: usize,
    /// Whether a load is in flight
    pub loading: bool,
    /// Message of the last failed load
    pub last_error: Option<String>,
}

impl<R> Default for ViewState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filters: Filters::default(),
            selection: None,
            modal: ModalState::Closed,
            page: 1,
            loading: false,
            last_error: None,
        }
    }
}

impl<R: Resource> ViewState<R> {
    /// Merge the provided fields of `patch`
    pub fn apply(&mut self, patch: ViewPatch<R>) {
        let ViewPatch {
            items,
            filters,
            selection,
            modal,
            page,
            loading,
            last_error,
        } = patch;

        if let Some(items) = items {
            self.items = items;
        }
        if let Some(filters) = filters {
            self.filters = filters;
        }
        if let Some(selection) = selection {
            self.selection = selection;
        }
        if let Some(modal) = modal {
            self.modal = modal;
        }
        if let Some(page) = page {
            self.page = page;
        }
        if let Some(loading) = loading {
            self.loading = loading;
        }
        if let Some(last_error) = last_error {
            self.last_error = last_error;
        }
    }

    /// Record with `id`, if present
    pub fn find(&self, id: RecordId) -> Option<&R> {
        self.items.iter().find(|r| r.id() == id)
    }

    /// Replace the record with the same id, or append it
    pub fn upsert(&mut self, record: R) {
        let id = record.id();
        match self.items.iter_mut().find(|r| r.id() == id) {
            Some(slot) => *slot = record,
            None => self.items.push(record),
        }
    }

    /// Remove the record with `id`, returning it with its former position
    pub fn remove(&mut self, id: RecordId) -> Option<(usize, R)> {
        let index = self.items.iter().position(|r| r.id() == id)?;
        if self.selection == Some(id) {
            self.selection = None;
        }
        Some((index, self.items.remove(index)))
    }

    /// Insert `record` at `index`, or at the end if the list has shrunk
    pub fn insert_at(&mut self, index: usize, record: R) {
        let index = index.min(self.items.len());
        self.items.insert(index, record);
    }
}

/// Partial update of a [`ViewState`]; `None` leaves a field untouched
#[derive(Debug, Clone)]
pub struct ViewPatch<R> {
    items: Option<Vec<R>>,
    filters: Option<Filters>,
    selection: Option<Option<RecordId>>,
    modal: Option<ModalState<R>>,
    page: Option<usize>,
    loading: Option<bool>,
    last_error: Option<Option<String>>,
}

impl<R> Default for ViewPatch<R> {
    fn default() -> Self {
        Self {
            items: None,
            filters: None,
            selection: None,
            modal: None,
            page: None,
            loading: None,
            last_error: None,
        }
    }
}

impl<R> ViewPatch<R> {
    /// Empty patch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection
    #[must_use]
    pub fn items(mut self, items: Vec<R>) -> Self {
        self.items = Some(items);
        self
    }

    /// Replace the filters
    #[must_use]
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Set or clear the selection
    #[must_use]
    pub fn selection(mut self, selection: Option<RecordId>) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Replace the modal state
    #[must_use]
    pub fn modal(mut self, modal: ModalState<R>) -> Self {
        self.modal = Some(modal);
        self
    }

    /// Jump to a page
    #[must_use]
    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the loading flag
    #[must_use]
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    /// Set or clear the last error
    #[must_use]
    pub fn last_error(mut self, last_error: Option<String>) -> Self {
        self.last_error = Some(last_error);
        self
    }
}

/// Cloneable handle to one page's [`ViewState`]
#[derive(Debug)]
pub struct ViewStore<R> {
    state: Arc<RwLock<ViewState<R>>>,
}

impl<R> Clone for ViewStore<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Resource> Default for ViewStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> ViewStore<R> {
    /// Store with an empty collection on page 1
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(ViewState::default())
    }

    /// Store starting from `state`
    #[must_use]
    pub fn with_state(state: ViewState<R>) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Snapshot of the whole state
    #[must_use]
    pub fn get(&self) -> ViewState<R> {
        self.state.read().clone()
    }

    /// Borrow the state for a read
    pub fn read<T>(&self, f: impl FnOnce(&ViewState<R>) -> T) -> T {
        f(&self.state.read())
    }

    /// Merge the provided fields of `patch`
    pub fn set(&self, patch: ViewPatch<R>) {
        self.state.write().apply(patch);
    }

    /// Compound write under a single lock
    pub fn update<T>(&self, f: impl FnOnce(&mut ViewState<R>) -> T) -> T {
        f(&mut self.state.write())
    }

    /// Snapshot of the collection
    #[must_use]
    pub fn items(&self) -> Vec<R> {
        self.read(|s| s.items.clone())
    }

    /// Copy of the record with `id`
    #[must_use]
    pub fn find(&self, id: RecordId) -> Option<R> {
        self.read(|s| s.find(id).cloned())
    }

    /// Replace the record with the same id, or append it
    pub fn upsert(&self, record: R) {
        self.update(|s| s.upsert(record));
    }

    /// Remove the record with `id`, returning it with its former position
    pub fn remove(&self, id: RecordId) -> Option<(usize, R)> {
        self.update(|s| s.remove(id))
    }

    /// Insert `record` at `index`
    pub fn insert_at(&self, index: usize, record: R) {
        self.update(|s| s.insert_at(index, record));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nightdesk_core::types::{Artist, Event, EventStatus};
    use pretty_assertions::assert_eq;

    fn artist(id: RecordId, name: &str) -> Artist {
        Artist {
            id,
            name: name.to_string(),
            genre: "house".to_string(),
            bio: None,
            booking_fee: "1500".parse().unwrap(),
        }
    }

    fn names(store: &ViewStore<Artist>) -> Vec<String> {
        store.read(|s| s.items.iter().map(|a| a.name.clone()).collect())
    }

    #[test]
    fn test_set_merges_only_provided_fields() {
        let store = ViewStore::new();
        store.set(ViewPatch::new().items(vec![artist(1, "Ada")]).page(3));
        store.set(ViewPatch::new().loading(true));

        let state = store.get();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.page, 3);
        assert!(state.loading);
        assert_eq!(state.filters, Filters::default());
    }

    #[test]
    fn test_clearing_optional_fields() {
        let store: ViewStore<Artist> = ViewStore::new();
        store.set(ViewPatch::new().selection(Some(4)).last_error(Some("boom".into())));
        store.set(ViewPatch::new().selection(None).last_error(None));
        let state = store.get();
        assert_eq!(state.selection, None);
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn test_upsert_replaces_in_place_or_appends() {
        let store = ViewStore::new();
        store.set(ViewPatch::new().items(vec![artist(1, "Ada"), artist(2, "Bo")]));

        store.upsert(artist(1, "Ada Live"));
        store.upsert(artist(3, "Cy"));

        assert_eq!(names(&store), vec!["Ada Live", "Bo", "Cy"]);
    }

    #[test]
    fn test_remove_then_insert_restores_position() {
        let store = ViewStore::new();
        store.set(
            ViewPatch::new()
                .items(vec![artist(1, "Ada"), artist(2, "Bo"), artist(3, "Cy")])
                .selection(Some(2)),
        );

        let (index, removed) = store.remove(2).unwrap();
        assert_eq!(index, 1);
        assert_eq!(store.get().selection, None);
        assert!(store.remove(2).is_none());

        store.insert_at(index, removed);
        assert_eq!(names(&store), vec!["Ada", "Bo", "Cy"]);
    }

    #[test]
    fn test_insert_past_end_appends() {
        let store = ViewStore::new();
        store.insert_at(10, artist(9, "Zed"));
        assert_eq!(store.find(9).map(|a| a.name), Some("Zed".to_string()));
    }

    #[test]
    fn test_clones_share_state() {
        let store: ViewStore<Event> = ViewStore::new();
        let other = store.clone();
        other.upsert(Event {
            id: 1,
            name: "Opening".into(),
            description: None,
            venue: "Hall".into(),
            category: "concert".into(),
            status: EventStatus::Upcoming,
            starts_at: Utc.with_ymd_and_hms(2026, 1, 1, 20, 0, 0).unwrap(),
            ends_at: None,
            capacity: 10,
            tickets_sold: 0,
        });
        assert_eq!(store.items().len(), 1);
    }
}
