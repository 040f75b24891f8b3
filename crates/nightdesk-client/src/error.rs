//! HTTP-layer errors

use thiserror::Error;

/// Errors raised while talking to the REST backend
///
/// These are converted into [`nightdesk_core::Error`] at the crate boundary so
/// the console deals with a single taxonomy.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the body
        message: String,
    },

    /// Backend answered 404
    #[error("Not found: {path}")]
    NotFound {
        /// Request path
        path: String,
    },

    /// Response body was not the expected JSON shape
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Client could not be constructed
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl From<ClientError> for nightdesk_core::Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_decode() => Self::Transport(format!("broken body: {e}")),
            ClientError::Http(e) => Self::Transport(e.to_string()),
            ClientError::Api { status, message } => Self::Api { status, message },
            ClientError::NotFound { path } => Self::NotFound { resource: path },
            ClientError::Decode(e) => Self::Serialization(e),
            ClientError::Config(message) => Self::Configuration { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_api_error_maps_to_core() {
        let err: nightdesk_core::Error = ClientError::Api {
            status: 409,
            message: "Serial number already registered".to_string(),
        }
        .into();

        match err {
            nightdesk_core::Error::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Serial number already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_maps_to_core() {
        let err: nightdesk_core::Error = ClientError::NotFound {
            path: "/api/events/5".to_string(),
        }
        .into();
        assert!(matches!(err, nightdesk_core::Error::NotFound { .. }));
        assert!(err.is_remote());
    }
}
