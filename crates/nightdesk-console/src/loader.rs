//! Fetch orchestration with last-issued-wins sequencing
//!
//! Each load takes a ticket from a monotonically increasing sequence. A
//! result is written only if its ticket is still the newest one issued, and
//! the check happens under the store's write lock so it cannot interleave
//! with another writer.

use crate::notify::{Notification, SharedNotifier, noun};
use crate::store::ViewStore;
use nightdesk_client::{ListFilter, SharedApi};
use nightdesk_core::{Resource, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// How a load settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result replaced the stored collection
    Applied {
        /// Number of records received
        count: usize,
    },
    /// A newer load or a local write superseded this one; nothing was written
    Stale {
        /// Ticket of this load
        ticket: u64,
        /// Newest ticket at resolution time
        latest: u64,
    },
    /// The backend call failed; the collection was left untouched
    Failed {
        /// User-facing message
        message: String,
    },
}

impl LoadOutcome {
    /// Whether the result was written to the store
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Populates a [`ViewStore`] from a backend
pub struct Loader<R> {
    api: SharedApi<R>,
    store: ViewStore<R>,
    notifier: SharedNotifier,
    sequence: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    last_filter: Arc<Mutex<ListFilter>>,
}

impl<R> Clone for Loader<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
            sequence: Arc::clone(&self.sequence),
            in_flight: Arc::clone(&self.in_flight),
            last_filter: Arc::clone(&self.last_filter),
        }
    }
}

impl<R> std::fmt::Debug for Loader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("latest", &self.sequence.load(Ordering::SeqCst))
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<R: Resource> Loader<R> {
    /// Create a loader writing into `store`
    pub fn new(api: SharedApi<R>, store: ViewStore<R>, notifier: SharedNotifier) -> Self {
        Self {
            api,
            store,
            notifier,
            sequence: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            last_filter: Arc::new(Mutex::new(ListFilter::new())),
        }
    }

    /// Store this loader writes into
    pub const fn store(&self) -> &ViewStore<R> {
        &self.store
    }

    /// Newest ticket issued so far
    #[must_use]
    pub fn latest_ticket(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Retire every in-flight load
    ///
    /// Called whenever local state is written outside a load so that a
    /// snapshot fetched before the write cannot overwrite it.
    pub fn invalidate(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch the collection narrowed by `filter` and apply it if still current
    pub async fn load(&self, filter: ListFilter) -> LoadOutcome {
        self.last_filter.lock().clone_from(&filter);

        let ticket = self.store.update(|state| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            state.loading = true;
            self.sequence.fetch_add(1, Ordering::SeqCst) + 1
        });
        debug!(collection = R::COLLECTION, ticket, "load issued");

        let pending = Pending {
            loader: self,
            ticket,
            armed: true,
        };
        let result = self.api.list(&filter).await;
        pending.disarm();
        self.settle(ticket, result)
    }

    /// Repeat the last load with the same filter
    pub async fn reload(&self) -> LoadOutcome {
        let filter = self.last_filter.lock().clone();
        self.load(filter).await
    }

    /// Drop one in-flight load; returns whether others are still running
    fn release(&self) -> bool {
        self.in_flight.fetch_sub(1, Ordering::SeqCst) > 1
    }

    fn settle(&self, ticket: u64, result: Result<Vec<R>>) -> LoadOutcome {
        let outcome = self.store.update(|state| {
            state.loading = self.release();

            let latest = self.sequence.load(Ordering::SeqCst);
            if ticket != latest {
                return LoadOutcome::Stale { ticket, latest };
            }

            match result {
                Ok(items) => {
                    let count = items.len();
                    state.items = items;
                    state.last_error = None;
                    LoadOutcome::Applied { count }
                }
                Err(err) => {
                    let message = err.user_message();
                    state.last_error = Some(message.clone());
                    LoadOutcome::Failed { message }
                }
            }
        });

        match &outcome {
            LoadOutcome::Applied { count } => {
                debug!(collection = R::COLLECTION, ticket, count, "load applied");
            }
            LoadOutcome::Stale { latest, .. } => {
                debug!(collection = R::COLLECTION, ticket, latest, "stale load discarded");
            }
            LoadOutcome::Failed { message } => {
                warn!(collection = R::COLLECTION, ticket, %message, "load failed");
                self.notifier.notify(Notification::error(format!(
                    "Could not load {}s: {message}",
                    noun(R::LABEL)
                )));
            }
        }
        outcome
    }
}

/// A load awaiting its response
///
/// Dropping it before the response arrives (a cancelled future) still
/// releases its in-flight slot so `loading` cannot stick.
struct Pending<'a, R: Resource> {
    loader: &'a Loader<R>,
    ticket: u64,
    armed: bool,
}

impl<R: Resource> Pending<'_, R> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<R: Resource> Drop for Pending<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let loader = self.loader;
        loader.store.update(|state| state.loading = loader.release());
        debug!(collection = R::COLLECTION, ticket = self.ticket, "load abandoned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Level, ToastQueue};
    use nightdesk_client::{MockApi, Operation};
    use nightdesk_core::Error;
    use nightdesk_core::types::{PaymentKind, PaymentMethod};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn method(id: i64, label: &str) -> PaymentMethod {
        PaymentMethod {
            id,
            label: label.to_string(),
            kind: PaymentKind::Card,
            last_four: None,
            is_default: false,
        }
    }

    fn setup(api: &MockApi<PaymentMethod>) -> (Loader<PaymentMethod>, Arc<ToastQueue>) {
        let toasts = Arc::new(ToastQueue::new(8));
        let loader = Loader::new(Arc::new(api.clone()), ViewStore::new(), toasts.clone());
        (loader, toasts)
    }

    #[tokio::test]
    async fn test_successful_load_replaces_items() {
        let api = MockApi::with_records(vec![method(1, "Visa"), method(2, "Cash drawer")]);
        let (loader, toasts) = setup(&api);

        let outcome = loader.load(ListFilter::new()).await;

        assert_eq!(outcome, LoadOutcome::Applied { count: 2 });
        let state = loader.store().get();
        assert_eq!(state.items.len(), 2);
        assert!(!state.loading);
        assert!(toasts.is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_items_and_notifies() {
        let api = MockApi::with_records(vec![method(1, "Visa")]);
        let (loader, toasts) = setup(&api);
        loader.load(ListFilter::new()).await;

        api.fail_next(Operation::List, Error::Transport("connection reset".into()));
        let outcome = loader.reload().await;

        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                message: "Could not reach the server".to_string()
            }
        );
        let state = loader.store().get();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.last_error.as_deref(), Some("Could not reach the server"));
        let toast = toasts.drain().pop().unwrap();
        assert_eq!(toast.level, Level::Error);
        assert_eq!(
            toast.message,
            "Could not load payment methods: Could not reach the server"
        );
    }

    #[tokio::test]
    async fn test_reload_repeats_last_filter() {
        let api = MockApi::with_records(vec![method(1, "Visa"), method(2, "Amex")]);
        let (loader, _) = setup(&api);

        loader.load(ListFilter::new().param("label", "Amex")).await;
        api.put_record(method(3, "Amex"));
        let outcome = loader.reload().await;

        assert_eq!(outcome, LoadOutcome::Applied { count: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_retires_in_flight_load() {
        let api = MockApi::new();
        api.push_list_response(Duration::from_millis(100), Ok(vec![method(1, "Old snapshot")]));
        let (loader, toasts) = setup(&api);

        let pending = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load(ListFilter::new()).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        loader.invalidate();

        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Stale { ticket: 1, latest: 2 }));
        let state = loader.store().get();
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert!(toasts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_load_clears_loading_flag() {
        let api = MockApi::new();
        api.push_list_response(Duration::from_secs(5), Ok(vec![method(1, "Never seen")]));
        let (loader, toasts) = setup(&api);

        let cut_short =
            tokio::time::timeout(Duration::from_millis(10), loader.load(ListFilter::new())).await;

        assert!(cut_short.is_err());
        let state = loader.store().get();
        assert!(!state.loading);
        assert!(state.items.is_empty());
        assert!(toasts.is_empty());

        // The next load still settles normally
        api.put_record(method(2, "Visa"));
        assert_eq!(loader.reload().await, LoadOutcome::Applied { count: 1 });
        assert!(!loader.store().get().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_is_silent() {
        let api = MockApi::new();
        api.push_list_response(
            Duration::from_millis(200),
            Err(Error::Transport("timeout".into())),
        );
        api.push_list_response(Duration::from_millis(50), Ok(vec![method(4, "Wallet")]));
        let (loader, toasts) = setup(&api);

        let (first, second) = tokio::join!(
            loader.load(ListFilter::new()),
            loader.load(ListFilter::new())
        );

        assert!(matches!(first, LoadOutcome::Stale { .. }));
        assert_eq!(second, LoadOutcome::Applied { count: 1 });
        assert_eq!(loader.store().get().last_error, None);
        assert!(toasts.is_empty());
    }
}
