//! Error types for the deploy client

use thiserror::Error;

/// Main error type for the deploy client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    /// An error reported by the deploy service, message kept verbatim.
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Whether the error was reported by the remote service
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::Remote { .. })
    }
}

impl From<tokio::task::JoinError> for ClientError {
    fn from(err: tokio::task::JoinError) -> Self {
        ClientError::Internal(err.to_string())
    }
}
