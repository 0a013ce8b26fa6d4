//! Error types for hub-client

use thiserror::Error;

/// Errors that can occur while talking to the model hub
#[derive(Error, Debug)]
pub enum HubError {
    /// Repository id is malformed
    #[error("Invalid repository id: {0}")]
    InvalidRepoId(String),

    /// Repository already exists (create conflict)
    #[error("Repository already exists: {0}")]
    Conflict(String),

    /// Repository or file not found on the hub
    #[error("Not found on hub: {0}")]
    NotFound(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Hub answered with an unexpected status
    #[error("Hub returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        HubError::Http(err.to_string())
    }
}
