use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::session::Session;
use crate::storage::errors::StorageError;

/// Persistence of sessions keyed by token.
///
/// Implementations own the stored copy; every value passed in or handed out
/// is detached from it. Network-backed implementations should do their I/O
/// inside the returned futures so that dropping a future abandons the call.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Inserts a copy of `session`. An existing record under the same token is
    /// replaced.
    async fn create(&self, session: &Session) -> Result<(), StorageError>;

    /// Returns a copy of the live session for `token`. Expired records are
    /// reported as [`StorageError::Expired`] and removed.
    async fn get(&self, token: &str) -> Result<Session, StorageError>;

    /// Replaces an existing record with a copy of `session`.
    async fn update(&self, session: &Session) -> Result<(), StorageError>;

    /// Lightweight path touching only the activity and expiry timestamps.
    async fn update_activity(
        &self,
        token: &str,
        last_activity_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Removing an absent token is not an error.
    async fn delete(&self, token: &str) -> Result<(), StorageError>;

    /// Removes every expired record and returns how many were removed.
    async fn delete_expired(&self) -> Result<usize, StorageError>;

    /// Removes every session of `user_id`, for "log out everywhere".
    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<usize, StorageError> {
        let _ = user_id;
        Err(StorageError::Backend(
            "delete_by_user_id is not supported by this store".to_string(),
        ))
    }
}

pub(crate) fn validate_for_write(session: &Session) -> Result<(), StorageError> {
    if session.token.is_empty() {
        return Err(StorageError::InvalidSession(
            "session token is empty".to_string(),
        ));
    }
    Ok(())
}
