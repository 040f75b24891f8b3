//! `NightDesk` console core
//!
//! Client-side state for the events, ticketing and POS console: a local store
//! per page, last-issued-wins loading, optimistic deletes with rollback,
//! confirmed creates and updates, derived filtered views and dashboard
//! aggregates. The REST backend is the source of truth for every record.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod dashboard;
pub mod derived;
pub mod loader;
pub mod modal;
pub mod mutation;
pub mod notify;
pub mod page;
pub mod session;
pub mod state;
pub mod store;

// Re-export the main types
pub use dashboard::DashboardData;
pub use derived::{ALL, Filterable, Filters, PageSlice, derived_view, paginate};
pub use loader::{LoadOutcome, Loader};
pub use modal::{ModalMode, ModalState};
pub use mutation::{DeleteOutcome, Mutations, TentativeDelete};
pub use notify::{Level, Notification, Notifier, SharedNotifier, ToastQueue, TracingNotifier};
pub use page::CollectionPage;
pub use session::{Capability, Managed, Session, SessionContext, SessionStore, start_pos_session};
pub use state::AppState;
pub use store::{ViewPatch, ViewState, ViewStore};
