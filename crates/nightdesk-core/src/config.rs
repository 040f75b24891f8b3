//! Configuration management for the `NightDesk` console

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Console view configuration
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Session marker storage
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent as `X-API-Key`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds; the HTTP client default applies when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Console view configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Rows per page in collection views
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum queued toasts before the oldest is dropped
    #[serde(default = "default_toast_capacity")]
    pub toast_capacity: usize,
}

/// Session marker storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// File holding the persisted session marker
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_page_size() -> usize {
    20
}

const fn default_toast_capacity() -> usize {
    32
}

fn default_session_path() -> PathBuf {
    PathBuf::from("./nightdesk-session.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout_secs: None,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            toast_capacity: default_toast_capacity(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from an optional `nightdesk` file and the environment
    ///
    /// Environment variables use the `NIGHTDESK` prefix with `__` between
    /// sections, e.g. `NIGHTDESK__API__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        debug!("loading configuration from ./nightdesk.* and the environment");
        Self::build(config::File::with_name("nightdesk").required(false))
    }

    /// Load configuration from an explicit file plus the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the result is invalid.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        debug!(path = %path.display(), "loading configuration");
        Self::build(config::File::from(path).required(true))
    }

    fn build<S>(file: S) -> crate::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("NIGHTDESK").separator("__"))
            .build()?
            .try_deserialize()?;

        if let Err(e) = config.validate() {
            warn!(error = %e, "configuration rejected");
            return Err(e);
        }
        debug!(
            base_url = %config.api.base_url,
            page_size = config.console.page_size,
            log_format = %config.logging.format,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Check values the serde defaults cannot guard
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] describing the first bad value.
    pub fn validate(&self) -> crate::Result<()> {
        let fail = |message: &str| {
            Err(crate::Error::Configuration {
                message: message.to_string(),
            })
        };

        if self.api.base_url.trim().is_empty() {
            return fail("api.base_url must not be empty");
        }
        if self.console.page_size == 0 {
            return fail("console.page_size must be at least 1");
        }
        if self.console.toast_capacity == 0 {
            return fail("console.toast_capacity must be at least 1");
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return fail("logging.format must be json or text");
        }
        Ok(())
    }
}
