//! REST client and backend contract for the `NightDesk` console
//!
//! The backend is the source of truth for every resource. This crate exposes
//! the contract the console consumes ([`ResourceApi`]), an HTTP implementation
//! of it ([`ApiClient`]) and an in-memory implementation ([`MockApi`]).

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod error;
pub mod mock;
pub mod resource_api;

pub use api_client::ApiClient;
pub use error::ClientError;
pub use mock::{MockApi, Operation};
pub use resource_api::{ListFilter, ResourceApi, SharedApi};
