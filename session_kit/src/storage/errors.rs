use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    /// Failure of the backing service of a durable store.
    #[error("Storage backend error: {0}")]
    Backend(String),
}
