//! Core records, errors and configuration for the `NightDesk` console

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use types::{RecordId, Resource};

use config::LoggingConfig;

/// Initialize the logging system
///
/// The `RUST_LOG` environment variable overrides the configured level.
///
/// # Errors
///
/// Returns an error if the log format is unknown or a global subscriber is
/// already installed.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match logging.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "text" => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        other => {
            return Err(Error::Configuration {
                message: format!("unknown log format: {other}"),
            });
        }
    };

    installed.map_err(|e| Error::Configuration {
        message: format!("logging already initialized: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_rejects_unknown_format() {
        let logging = LoggingConfig {
            level: "info".to_string(),
            format: "xml".to_string(),
        };

        let err = init_logging(&logging).unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }
}
