//! Application state management

use crate::dashboard::DashboardData;
use crate::derived::Filterable;
use crate::notify::ToastQueue;
use crate::page::CollectionPage;
use crate::session::{FileSessionStore, Managed, SessionContext};
use nightdesk_client::ApiClient;
use nightdesk_core::{Config, Resource, Result};
use std::sync::Arc;
use tracing::info;

/// Application state holding configuration, the backend client, the toast
/// queue and the operator session
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// API client for backend communication
    pub api_client: ApiClient,
    /// Notifications waiting to be shown
    pub toasts: Arc<ToastQueue>,
    /// Signed-in operator
    pub session: SessionContext,
}

impl AppState {
    /// Build state from configuration, restoring any persisted session
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the HTTP client
    /// cannot be built or the session file cannot be read.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api_client = ApiClient::from_config(&config.api)?;
        let session = SessionContext::restore(Arc::new(FileSessionStore::from_config(
            &config.session,
        )))?;
        Ok(Self::with_parts(config, api_client, session))
    }

    /// Build state from already constructed parts
    #[must_use]
    pub fn with_parts(config: Config, api_client: ApiClient, session: SessionContext) -> Self {
        let toasts = Arc::new(ToastQueue::new(config.console.toast_capacity));
        info!(
            base_url = api_client.base_url(),
            page_size = config.console.page_size,
            "console state ready"
        );
        Self {
            config,
            api_client,
            toasts,
            session,
        }
    }

    /// List page for one resource, backed by the REST client
    #[must_use]
    pub fn page<R: Resource + Filterable + Managed>(&self) -> CollectionPage<R> {
        CollectionPage::new(
            Arc::new(self.api_client.clone()),
            self.toasts.clone(),
            self.session.clone(),
            self.config.console.page_size,
        )
    }

    /// Fetch the dashboard collections
    pub async fn dashboard(&self) -> DashboardData {
        DashboardData::load(&self.api_client, &self.api_client, self.toasts.as_ref()).await
    }
}
