use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::session::{Session, SessionStats};
use crate::storage::errors::StorageError;
use crate::storage::types::{SessionStore, validate_for_write};
use crate::utils::token_prefix;

type SessionMap = Arc<RwLock<HashMap<String, Arc<Session>>>>;

/// Reference [`SessionStore`] keeping everything in process memory.
///
/// Records are held behind `Arc` so readers clone the pointer under the lock
/// and do the deep copy after releasing it. Writers never mutate a record a
/// reader may still be copying: `Arc::make_mut` copies on write in that case.
pub struct InMemorySessionStore {
    sessions: SessionMap,
    sweeper: Mutex<Option<Sweeper>>,
}

struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory session store");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a store with a background task sweeping expired sessions every
    /// `interval`. A zero or negative interval, or the absence of a tokio
    /// runtime, leaves the sweeper off.
    pub fn with_cleanup_interval(interval: Duration) -> Self {
        let store = Self::new();

        let Ok(period) = interval.to_std() else {
            return store;
        };
        if period.is_zero() {
            return store;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime available; expired-session sweeper not started");
            return store;
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = runtime.spawn(sweep_loop(store.sessions.clone(), period, shutdown_rx));
        tracing::info!("Started expired-session sweeper every {:?}", period);

        if let Ok(mut sweeper) = store.sweeper.lock() {
            *sweeper = Some(Sweeper { shutdown, handle });
        }
        store
    }

    /// Stops the background sweeper, if any, and waits for it to finish.
    pub async fn close(&self) {
        let sweeper = self.sweeper.lock().ok().and_then(|mut guard| guard.take());
        if let Some(Sweeper { shutdown, handle }) = sweeper {
            let _ = shutdown.send(true);
            if let Err(e) = handle.await {
                tracing::error!("Session sweeper task failed: {}", e);
            }
            tracing::info!("Stopped expired-session sweeper");
        }
    }

    pub fn has_sweeper(&self) -> bool {
        self.sweeper
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub async fn stats(&self) -> SessionStats {
        let sessions = self.sessions.read().await;
        let authenticated = sessions.values().filter(|s| s.is_authenticated()).count();
        SessionStats {
            total: sessions.len(),
            authenticated,
            anonymous: sessions.len() - authenticated,
        }
    }
}

impl Drop for InMemorySessionStore {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.sweeper.lock() {
            if let Some(sweeper) = guard.take() {
                let _ = sweeper.shutdown.send(true);
            }
        }
    }
}

async fn remove_expired(sessions: &SessionMap, now: DateTime<Utc>) -> usize {
    let mut sessions = sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired_at(now));
    before - sessions.len()
}

async fn sweep_loop(
    sessions: SessionMap,
    period: std::time::Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = remove_expired(&sessions, Utc::now()).await;
                if removed > 0 {
                    tracing::debug!("Swept {} expired sessions", removed);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), StorageError> {
        validate_for_write(session)?;
        let record = Arc::new(session.clone());

        self.sessions
            .write()
            .await
            .insert(session.token.clone(), record);

        tracing::debug!("Stored session {}", token_prefix(&session.token));
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Session, StorageError> {
        let record = self
            .sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(StorageError::NotFound)?;

        if record.is_expired() {
            let mut sessions = self.sessions.write().await;
            // Only drop the record we inspected; a concurrent update may have replaced it
            if sessions
                .get(token)
                .is_some_and(|current| Arc::ptr_eq(current, &record))
            {
                sessions.remove(token);
            }
            tracing::debug!("Session {} expired", token_prefix(token));
            return Err(StorageError::Expired);
        }

        Ok(Session::clone(&record))
    }

    async fn update(&self, session: &Session) -> Result<(), StorageError> {
        validate_for_write(session)?;
        let record = Arc::new(session.clone());

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.token) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn update_activity(
        &self,
        token: &str,
        last_activity_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(token).ok_or(StorageError::NotFound)?;

        let session = Arc::make_mut(record);
        session.last_activity_at = last_activity_at;
        session.expires_at = expires_at;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), StorageError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<usize, StorageError> {
        Ok(remove_expired(&self.sessions, Utc::now()).await)
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<usize, StorageError> {
        if user_id.is_nil() {
            return Err(StorageError::InvalidUserId(
                "nil UUID is not a user id".to_string(),
            ));
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != Some(user_id));
        let removed = before - sessions.len();

        tracing::debug!("Deleted {} sessions of user {}", removed, user_id);
        Ok(removed)
    }
}
