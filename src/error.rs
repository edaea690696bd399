//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror, plus
//! the mapping from each error kind onto the HTTP status returned to clients.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Failed to fetch source image: {reason}")]
    AssetFetch { status: Option<u16>, reason: String },

    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// HTTP status code this error is reported with.
    ///
    /// Provider rejections keep the provider's own status; a code that is not
    /// a valid HTTP status is reported as 502.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::UnsupportedAction(_) => 400,
            Error::Unauthorized => 401,
            Error::NotFound(_) => 404,
            Error::Provider { status, .. } if (100..=599).contains(status) => *status,
            Error::Provider { .. } => 502,
            _ => 500,
        }
    }

    /// Message safe to return to clients; transport and storage details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            Error::Validation(_)
            | Error::UnsupportedAction(_)
            | Error::Provider { .. }
            | Error::NotFound(_)
            | Error::Unauthorized => self.to_string(),
            Error::AssetFetch { .. } => "Failed to fetch source image".to_string(),
            Error::MalformedResponse(_) => "Failed to edit image".to_string(),
            _ => "Internal Error".to_string(),
        }
    }

    /// True for errors caused by the client request rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::UnsupportedAction(_)
                | Error::Unauthorized
                | Error::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
