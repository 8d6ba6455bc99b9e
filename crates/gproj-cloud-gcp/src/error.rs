//! Google Cloud provider error types

use gproj_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Error body returned by a Google API (`{"error": {...}}`)
    #[error("Google API error {code} {status}: {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    #[error("unable to obtain an access token: {0}")]
    Credentials(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GcpError> for CloudError {
    fn from(e: GcpError) -> Self {
        match e {
            GcpError::Api { code, message, .. } => CloudError::Api { code, message },
            GcpError::Json(e) => CloudError::Json(e),
            GcpError::Io(e) => CloudError::Io(e),
            other => CloudError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GcpError>;
