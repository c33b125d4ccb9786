use thiserror::Error;

use crate::cookie::CookieError;
use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Structurally broken session value, or a fingerprint mismatch.
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Session expired")]
    SessionExpired,

    /// No token in the request, or no record for the presented token.
    #[error("Session not found")]
    SessionNotFound,

    #[error("Token generation error: {0}")]
    TokenGeneration(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cookie error: {0}")]
    Cookie(#[from] CookieError),
}

impl SessionError {
    /// True for the "no usable session" kinds a client can recover from by
    /// starting over, as opposed to infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidSession(_)
                | SessionError::SessionExpired
                | SessionError::SessionNotFound
        )
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidSession(msg) => SessionError::InvalidSession(msg),
            StorageError::InvalidUserId(msg) => {
                SessionError::InvalidSession(format!("invalid user id: {msg}"))
            }
            StorageError::NotFound => SessionError::SessionNotFound,
            StorageError::Expired => SessionError::SessionExpired,
            StorageError::Backend(msg) => SessionError::Storage(msg),
        }
    }
}

impl From<UtilError> for SessionError {
    fn from(err: UtilError) -> Self {
        SessionError::TokenGeneration(err.to_string())
    }
}
