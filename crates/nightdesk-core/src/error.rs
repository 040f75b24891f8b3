//! Error types for the `NightDesk` console

use std::{error::Error as StdError, fmt};

/// Main error type for the `NightDesk` console
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Client-side validation error, raised before any remote call
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// The backend answered with a non-success status
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Not found error
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Network-level failure (connection refused, timeout, broken body)
    Transport(String),

    /// Serialization error
    Serialization(serde_json::Error),

    /// Session storage error
    Session(String),

    /// A modal flow was asked to do something its current state forbids
    InvalidTransition {
        /// State the flow was in
        from: String,
        /// Action that was attempted
        action: String,
    },

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error came from a remote call rather than local checks
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::NotFound { .. } | Self::Transport(_) | Self::Serialization(_)
        )
    }

    /// Short text suitable for a toast
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => format!("{field}: {message}"),
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::Api { status, .. } => format!("Server error ({status})"),
            Self::NotFound { resource } => format!("{resource} no longer exists"),
            Self::Transport(_) => "Could not reach the server".to_string(),
            Self::Serialization(_) => "Unexpected response from the server".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::Api { status, message } => write!(f, "API error ({status}): {message}"),
            Self::NotFound { resource } => write!(f, "Resource not found: {resource}"),
            Self::Transport(msg) => write!(f, "Transport error: {msg}"),
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Session(msg) => write!(f, "Session error: {msg}"),
            Self::InvalidTransition { from, action } => {
                write!(f, "Cannot {action} while {from}")
            }
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

// From implementations for automatic conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(ToString::to_string))
                    .or_else(|| errs.first().map(|e| e.code.to_string()))
                    .unwrap_or_else(|| "invalid".to_string());
                // Struct-level checks carry the offending field in their code
                let field = match (&*field, errs.first()) {
                    ("__all__", Some(first)) => first.code.to_string(),
                    _ => field.to_string(),
                };
                (field, message)
            })
            .collect();
        // HashMap order is unstable; report the alphabetically first field
        fields.sort();

        match fields.into_iter().next() {
            Some((field, message)) => Self::Validation { field, message },
            None => Self::Validation {
                field: "__all__".to_string(),
                message: errors.to_string(),
            },
        }
    }
}
