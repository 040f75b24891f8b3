//! HTTP client for communicating with the `NightDesk` REST backend

use crate::error::ClientError;
use crate::resource_api::{ListFilter, ResourceApi};
use async_trait::async_trait;
use nightdesk_core::config::ApiConfig;
use nightdesk_core::{RecordId, Resource, Result};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

/// API client for making HTTP requests to the backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Responses may arrive bare or wrapped in `{"data": ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Bare(T),
    Wrapped { data: T },
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Bare(value) | Self::Wrapped { data: value } => value,
        }
    }
}

impl ApiClient {
    /// Create a new API client using the HTTP client's default timeouts
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Set the API key for authentication
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_path<R: Resource>() -> String {
        format!("/api/{}", R::COLLECTION)
    }

    fn record_path<R: Resource>(id: RecordId) -> String {
        format!("/api/{}/{id}", R::COLLECTION)
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<reqwest::Response, ClientError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method.clone(), &url);
        if let Some(ref api_key) = self.api_key {
            request = request.header("X-API-Key", api_key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.inspect_err(|e| {
            warn!(%method, %url, error = %e, "request failed before a response arrived");
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(%method, %url, "resource not found");
            return Err(ClientError::NotFound {
                path: path.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_message(&body);
            warn!(%method, %url, status = status.as_u16(), %message, "API returned error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn fetch<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let response = self.send(method, path, body).await?;
        let bytes = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes).inspect_err(|e| {
            warn!(%path, error = %e, "response body did not match the expected shape");
        })?;
        Ok(envelope.into_inner())
    }
}

/// Pull a human-readable message out of an error body
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for ApiClient {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<R>> {
        let mut path = Self::collection_path::<R>();
        if !filter.is_empty() {
            path.push('?');
            path.push_str(&filter.to_query_string());
        }

        let items: Vec<R> = self.fetch::<_, ()>(Method::GET, &path, None).await?;
        debug!(collection = R::COLLECTION, count = items.len(), "listed records");
        Ok(items)
    }

    async fn create(&self, payload: &R::Insert) -> Result<R> {
        let path = Self::collection_path::<R>();
        let record: R = self.fetch(Method::POST, &path, Some(payload)).await?;
        debug!(collection = R::COLLECTION, id = record.id(), "created record");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R> {
        let path = Self::record_path::<R>(id);
        let record: R = self.fetch(Method::PATCH, &path, Some(patch)).await?;
        debug!(collection = R::COLLECTION, id, "updated record");
        Ok(record)
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let path = Self::record_path::<R>(id);
        self.send::<()>(Method::DELETE, &path, None).await?;
        debug!(collection = R::COLLECTION, id, "deleted record");
        Ok(())
    }
}
