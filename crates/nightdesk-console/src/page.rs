//! Collection page controller
//!
//! One generic controller backs every list page of the console: events,
//! ticket types, tickets, artists, promotions, POS devices, staff,
//! transactions and payment methods.

use crate::derived::{Filterable, Filters, PageSlice, derived_view, paginate};
use crate::loader::{LoadOutcome, Loader};
use crate::modal::ModalMode;
use crate::mutation::{DeleteOutcome, Mutations};
use crate::notify::SharedNotifier;
use crate::session::{Managed, SessionContext};
use crate::store::ViewStore;
use nightdesk_client::{ListFilter, SharedApi};
use nightdesk_core::{Error, RecordId, Resource, Result};

/// Controller wiring a store, loader, mutations, notifier and session
pub struct CollectionPage<R> {
    store: ViewStore<R>,
    loader: Loader<R>,
    mutations: Mutations<R>,
    session: SessionContext,
    per_page: usize,
}

impl<R> Clone for CollectionPage<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            loader: self.loader.clone(),
            mutations: self.mutations.clone(),
            session: self.session.clone(),
            per_page: self.per_page,
        }
    }
}

impl<R> std::fmt::Debug for CollectionPage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionPage")
            .field("loader", &self.loader)
            .field("session", &self.session)
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}

impl<R: Resource + Filterable + Managed> CollectionPage<R> {
    /// Create a page showing `per_page` records at a time
    pub fn new(
        api: SharedApi<R>,
        notifier: SharedNotifier,
        session: SessionContext,
        per_page: usize,
    ) -> Self {
        let store = ViewStore::new();
        let loader = Loader::new(api.clone(), store.clone(), notifier.clone());
        let mutations = Mutations::new(api, loader.clone(), notifier);
        Self {
            store,
            loader,
            mutations,
            session,
            per_page: per_page.max(1),
        }
    }

    /// Underlying state
    pub const fn store(&self) -> &ViewStore<R> {
        &self.store
    }

    /// Optimistic mutation handler
    pub const fn mutations(&self) -> &Mutations<R> {
        &self.mutations
    }

    /// Load the whole collection
    pub async fn mount(&self) -> LoadOutcome {
        self.mount_with(ListFilter::new()).await
    }

    /// Load the collection narrowed on the server side, e.g. by event
    pub async fn mount_with(&self, filter: ListFilter) -> LoadOutcome {
        self.loader.load(filter).await
    }

    /// Fetch again with the filter of the last load
    pub async fn refresh(&self) -> LoadOutcome {
        self.loader.reload().await
    }

    /// Change the search text and go back to the first page
    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.edit_filters(|f| f.search = search);
    }

    /// Change the status filter and go back to the first page
    pub fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.edit_filters(|f| f.status = status);
    }

    /// Change the category filter and go back to the first page
    pub fn set_category(&self, category: impl Into<String>) {
        let category = category.into();
        self.edit_filters(|f| f.category = category);
    }

    fn edit_filters(&self, edit: impl FnOnce(&mut Filters)) {
        self.store.update(|state| {
            edit(&mut state.filters);
            state.page = 1;
        });
    }

    /// Jump to a page, 1-based
    pub fn set_page(&self, page: usize) {
        self.store.update(|state| state.page = page.max(1));
    }

    /// Select a record, or clear the selection
    pub fn select(&self, id: Option<RecordId>) {
        self.store.update(|state| state.selection = id);
    }

    /// Show the create form
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if the modal is already in use.
    pub fn open_create(&self) -> Result<()> {
        self.store.update(|state| state.modal.open_create())
    }

    /// Show the edit form for the record with `id`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the record is not loaded, or
    /// [`Error::InvalidTransition`] if the modal is already in use.
    pub fn open_edit(&self, id: RecordId) -> Result<()> {
        self.store.update(|state| {
            let item = state.find(id).cloned().ok_or_else(|| Error::NotFound {
                resource: format!("{} {id}", R::LABEL),
            })?;
            state.modal.open_edit(item)?;
            state.selection = Some(id);
            Ok(())
        })
    }

    /// Dismiss the form
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the form is open.
    pub fn cancel_modal(&self) -> Result<()> {
        self.store.update(|state| state.modal.cancel())
    }

    /// Submit the create form
    ///
    /// The modal closes on success and reopens with the error otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the create form is open,
    /// or the validation/backend error of the submission.
    pub async fn submit_create(&self, payload: &R::Insert) -> Result<R> {
        self.store.update(|state| {
            if !matches!(state.modal.mode(), Some(ModalMode::Create)) {
                return Err(wrong_form(state.modal.name(), "submit a new record"));
            }
            state.modal.begin_submit().map(drop)
        })?;

        let result = self.mutations.create(payload).await;
        self.settle(&result)?;
        result
    }

    /// Submit the edit form
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the edit form is open,
    /// or the validation/backend error of the submission.
    pub async fn submit_edit(&self, patch: &R::Patch) -> Result<R> {
        let id = self.store.update(|state| {
            let id = match state.modal.mode() {
                Some(ModalMode::Edit(item)) => item.id(),
                _ => return Err(wrong_form(state.modal.name(), "submit changes")),
            };
            state.modal.begin_submit()?;
            Ok(id)
        })?;

        let result = self.mutations.update(id, patch).await;
        self.settle(&result)?;
        result
    }

    fn settle(&self, result: &Result<R>) -> Result<()> {
        let outcome = result.as_ref().map(drop).map_err(Error::user_message);
        self.store.update(|state| state.modal.finish(outcome))
    }

    /// Delete a record optimistically
    pub async fn delete(&self, id: RecordId) -> DeleteOutcome {
        self.mutations.delete(id).await
    }

    /// Current page of records passing the filters
    #[must_use]
    pub fn visible(&self) -> PageSlice<R> {
        self.store.read(|state| {
            let view = derived_view(&state.items, &state.filters);
            paginate(&view, state.page, self.per_page).map(R::clone)
        })
    }

    /// Whether the signed-in operator may create, edit or delete here
    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.session.can(R::MANAGE)
    }
}

fn wrong_form(from: &str, action: &str) -> Error {
    Error::InvalidTransition {
        from: from.to_string(),
        action: action.to_string(),
    }
}
