// Error handling module
// Distinguishes "your action failed" from "your session ended"

use thiserror::Error;

use crate::realm::Realm;

/// Errors surfaced by the API client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The backend rejected the request. Pass-through: non-auth failures,
    /// auth failures on exempt endpoints, and second auth failures on a
    /// request that was already retried.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The session could not be repaired. The realm's credentials were
    /// cleared and the caller must log in again.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// The realm already has the maximum number of requests parked behind
    /// its in-flight refresh; this one was rejected without being queued.
    #[error("Retry queue full for {0:?} realm")]
    RetryQueueFull(Realm),

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// True when the error means the realm's session ended and the user
    /// must authenticate again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired(_))
    }

    /// HTTP status of a pass-through API error, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
