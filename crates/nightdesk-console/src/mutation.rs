//! Optimistic and confirmed mutations
//!
//! Deletes are optimistic: the record disappears locally before the backend
//! answers, then the collection is reconciled with a fresh load. Creates and
//! updates are confirmed: local state changes only once the backend returns
//! the authoritative record. Nothing is retried.

use crate::loader::Loader;
use crate::notify::{Notification, SharedNotifier, noun};
use crate::store::ViewStore;
use nightdesk_client::SharedApi;
use nightdesk_core::{Error, RecordId, Resource, Result};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// A record removed locally while its remote deletion is pending
#[derive(Debug, Clone, PartialEq)]
pub struct TentativeDelete<R> {
    index: usize,
    record: R,
}

impl<R> TentativeDelete<R> {
    /// Position the record occupied
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The removed record
    #[must_use]
    pub const fn record(&self) -> &R {
        &self.record
    }
}

/// Result of an optimistic delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The backend accepted the deletion
    pub confirmed: bool,
    /// The follow-up load was applied
    pub reconciled: bool,
}

/// Runs writes against the backend and keeps the store consistent
pub struct Mutations<R> {
    api: SharedApi<R>,
    loader: Loader<R>,
    notifier: SharedNotifier,
}

impl<R> Clone for Mutations<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            loader: self.loader.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<R> std::fmt::Debug for Mutations<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutations")
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> Mutations<R> {
    /// Create a mutation handler sharing `loader`'s store and sequence
    pub fn new(api: SharedApi<R>, loader: Loader<R>, notifier: SharedNotifier) -> Self {
        Self {
            api,
            loader,
            notifier,
        }
    }

    fn store(&self) -> &ViewStore<R> {
        self.loader.store()
    }

    /// Remove a record locally, remembering where it was
    ///
    /// Retires in-flight loads so a snapshot taken before the removal cannot
    /// bring the record back.
    pub fn begin_delete(&self, id: RecordId) -> Option<TentativeDelete<R>> {
        self.store().update(|state| {
            let (index, record) = state.remove(id)?;
            self.loader.invalidate();
            Some(TentativeDelete { index, record })
        })
    }

    /// Put a tentatively deleted record back at its former position
    ///
    /// Does nothing if a record with the same id is already present. Loads in
    /// flight are left alone: any snapshot they bring still holds the record.
    pub fn rollback(&self, tentative: TentativeDelete<R>) {
        let TentativeDelete { index, record } = tentative;
        let id = record.id();
        self.store().update(|state| {
            if state.find(id).is_none() {
                state.insert_at(index, record);
            }
        });
        info!(collection = R::COLLECTION, id, index, "restored record after failed delete");
    }

    /// Delete a record optimistically and reconcile with the backend
    pub async fn delete(&self, id: RecordId) -> DeleteOutcome {
        let tentative = self.begin_delete(id);

        match self.api.delete(id).await {
            Ok(()) => {
                info!(collection = R::COLLECTION, id, "record deleted");
                self.notifier
                    .notify(Notification::success(format!("{} deleted", R::LABEL)));
                let reconciled = self.loader.reload().await.is_applied();
                DeleteOutcome {
                    confirmed: true,
                    reconciled,
                }
            }
            Err(err) => {
                warn!(collection = R::COLLECTION, id, error = %err, "delete failed");
                self.notifier.notify(Notification::error(format!(
                    "Could not delete {}: {}",
                    noun(R::LABEL),
                    err.user_message()
                )));

                // A failed or superseded reconcile leaves the local removal in
                // place; the record still exists remotely
                let outcome = self.loader.reload().await;
                if !outcome.is_applied()
                    && let Some(tentative) = tentative
                {
                    self.rollback(tentative);
                }
                DeleteOutcome {
                    confirmed: false,
                    reconciled: outcome.is_applied(),
                }
            }
        }
    }

    /// Validate and create a record; the store changes only on success
    ///
    /// # Errors
    ///
    /// Returns the validation error or the backend error. Either one has
    /// already been turned into a notification.
    pub async fn create(&self, payload: &R::Insert) -> Result<R> {
        self.check(payload)?;

        match self.api.create(payload).await {
            Ok(record) => {
                info!(collection = R::COLLECTION, id = record.id(), "record created");
                self.accept(record.clone());
                self.notifier
                    .notify(Notification::success(format!("{} created", R::LABEL)));
                Ok(record)
            }
            Err(err) => Err(self.reject("create", err)),
        }
    }

    /// Validate and apply a partial update; the store changes only on success
    ///
    /// # Errors
    ///
    /// Returns the validation error or the backend error. Either one has
    /// already been turned into a notification.
    pub async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R> {
        self.check(patch)?;

        match self.api.update(id, patch).await {
            Ok(record) => {
                info!(collection = R::COLLECTION, id, "record updated");
                self.accept(record.clone());
                self.notifier
                    .notify(Notification::success(format!("{} updated", R::LABEL)));
                Ok(record)
            }
            Err(err) => Err(self.reject("update", err)),
        }
    }

    fn check<P: Validate>(&self, payload: &P) -> Result<()> {
        payload.validate().map_err(|errors| {
            let err = Error::from(errors);
            warn!(collection = R::COLLECTION, error = %err, "payload rejected before sending");
            self.notifier.notify(Notification::warning(err.user_message()));
            err
        })
    }

    fn accept(&self, record: R) {
        self.store().update(|state| {
            self.loader.invalidate();
            state.upsert(record);
        });
    }

    fn reject(&self, action: &str, err: Error) -> Error {
        warn!(collection = R::COLLECTION, action, error = %err, "mutation failed");
        self.notifier.notify(Notification::error(format!(
            "Could not {action} {}: {}",
            noun(R::LABEL),
            err.user_message()
        )));
        err
    }
}
