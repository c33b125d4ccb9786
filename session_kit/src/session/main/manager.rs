use std::sync::Arc;

use chrono::Utc;
use http::HeaderMap;
use serde_json::Value;
use uuid::Uuid;

use super::activity::{ActivityUpdate, ActivityWorker};
use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::types::Session;
use crate::storage::SessionStore;
use crate::transport::Transport;
use crate::utils::{gen_random_string, token_prefix};

/// Derives a client fingerprint from inbound request headers.
pub type FingerprintFn = Arc<dyn Fn(&HeaderMap) -> String + Send + Sync>;

const TOKEN_BYTES: usize = 32;

/// Session lifecycle on top of a [`SessionStore`] and a [`Transport`].
///
/// Request-side operations read the inbound headers; response-side ones
/// write into the outbound headers, which the HTTP layer must merge into its
/// response. Build one with [`SessionManager::builder`].
pub struct SessionManager {
    pub(super) store: Arc<dyn SessionStore>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) config: SessionConfig,
    pub(super) fingerprint: Option<FingerprintFn>,
    pub(super) activity: ActivityWorker,
}

impl SessionManager {
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Returns the valid session of the request, or issues a new anonymous
    /// one.
    ///
    /// An expired, unknown or foreign-fingerprint token is not an error here:
    /// the stale token is cleared and replaced.
    #[tracing::instrument(skip_all)]
    pub async fn ensure(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<Session, SessionError> {
        if let Ok(token) = self.transport.get_token(request) {
            match self.load(&token, request).await {
                Ok(mut session) => {
                    self.track_activity(&mut session);
                    return Ok(session);
                }
                Err(e) => {
                    tracing::debug!(
                        "Replacing unusable session {}: {}",
                        token_prefix(&token),
                        e
                    );
                    if let Err(e) = self.transport.clear_token(response) {
                        tracing::warn!("Failed to clear stale session token: {}", e);
                    }
                }
            }
        }

        self.create_session(request, response, None).await
    }

    /// Read-only lookup of the request's session.
    ///
    /// Fails with `SessionNotFound`, `SessionExpired` or `InvalidSession`
    /// (fingerprint mismatch) without creating anything.
    #[tracing::instrument(skip_all)]
    pub async fn get(&self, request: &HeaderMap) -> Result<Session, SessionError> {
        let token = self.transport.get_token(request)?;
        self.load(&token, request).await
    }

    /// Binds the request's session to `user_id` under a fresh token.
    ///
    /// The previous record is deleted and its data carried over, unless it
    /// belonged to another user. Without a usable session a new
    /// authenticated one is created.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn authenticate(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        user_id: Uuid,
    ) -> Result<Session, SessionError> {
        if user_id.is_nil() {
            return Err(SessionError::InvalidSession(
                "Cannot authenticate the nil user id".to_string(),
            ));
        }

        let existing = match self.transport.get_token(request) {
            Ok(token) => self.load(&token, request).await.ok(),
            Err(_) => None,
        };

        let Some(mut session) = existing else {
            return self.create_session(request, response, Some(user_id)).await;
        };

        let new_token = gen_random_string(TOKEN_BYTES)?;
        let old_token = std::mem::replace(&mut session.token, new_token);
        self.store.delete(&old_token).await?;

        if session.user_id.is_some_and(|current| current != user_id) {
            tracing::info!("Session switched users; previous data discarded");
            session.clear();
        }

        let now = Utc::now();
        session.user_id = Some(user_id);
        session.last_activity_at = now;
        session.expires_at = self.config.next_expiry(&session, now);

        self.persist_new(&session, response).await?;

        tracing::info!(
            "Rotated session {} to {} on authentication",
            token_prefix(&old_token),
            token_prefix(&session.token)
        );
        Ok(session)
    }

    /// Deletes the request's session and clears its token. A missing
    /// session is not an error.
    #[tracing::instrument(skip_all)]
    pub async fn destroy(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<(), SessionError> {
        if let Ok(token) = self.transport.get_token(request) {
            match self.store.delete(&token).await {
                Ok(()) => tracing::info!("Destroyed session {}", token_prefix(&token)),
                Err(e) => tracing::debug!("Ignoring delete failure on destroy: {}", e),
            }
        }

        self.transport.clear_token(response)
    }

    /// Stores `value` under `key`, creating a session first if needed.
    #[tracing::instrument(skip_all, fields(key = %key))]
    pub async fn set(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Session, SessionError> {
        let mut session = self.ensure(request, response).await?;
        session.set(key, value);
        self.store.update(&session).await?;
        Ok(session)
    }

    /// Persists changes made to a detached copy, e.g. one taken from the
    /// request context by a handler.
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.store.update(session).await?;
        Ok(())
    }

    /// Reads one value of the request's session. Any failure reads as absent.
    pub async fn get_value(&self, request: &HeaderMap, key: &str) -> Option<Value> {
        match self.get(request).await {
            Ok(session) => session.get(key).cloned(),
            Err(e) => {
                tracing::trace!("No session value for {}: {}", key, e);
                None
            }
        }
    }

    /// Restarts the idle window from now and re-issues the token with the
    /// new TTL.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<Session, SessionError> {
        let mut session = self.get(request).await?;

        let now = Utc::now();
        session.last_activity_at = now;
        session.expires_at = self.config.next_expiry(&session, now);
        self.store.update(&session).await?;

        let ttl = self.config.idle_timeout(session.is_authenticated());
        self.transport.set_token(response, &session.token, ttl)?;

        tracing::debug!("Refreshed session {}", token_prefix(&session.token));
        Ok(session)
    }

    /// Records activity on `session` once the update threshold has passed.
    ///
    /// The caller's copy is updated immediately; the store write is queued
    /// and may be dropped under load. Returns whether an update was queued.
    pub fn track_activity(&self, session: &mut Session) -> bool {
        let now = Utc::now();
        if now - session.last_activity_at <= self.config.activity_update_threshold {
            return false;
        }

        session.last_activity_at = now;
        session.expires_at = self.config.next_expiry(session, now);

        self.activity.enqueue(ActivityUpdate {
            token: session.token.clone(),
            last_activity_at: session.last_activity_at,
            expires_at: session.expires_at,
        })
    }

    /// Deletes every session of `user_id` ("log out everywhere").
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn delete_user_sessions(&self, user_id: Uuid) -> Result<usize, SessionError> {
        let removed = self.store.delete_by_user_id(user_id).await?;
        tracing::info!("Deleted {} sessions", removed);
        Ok(removed)
    }

    /// Stops the activity worker after storing every queued update.
    /// Later activity is dropped.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down session manager");
        self.activity.shutdown().await;
    }

    async fn load(&self, token: &str, request: &HeaderMap) -> Result<Session, SessionError> {
        let session = self.store.get(token).await?;

        // Durable stores are not required to filter expired records
        if session.is_expired() {
            return Err(SessionError::SessionExpired);
        }

        if let Some(fingerprint) = &self.fingerprint {
            if !session.validate_fingerprint(&fingerprint(request)) {
                tracing::warn!("Fingerprint mismatch for session {}", token_prefix(token));
                return Err(SessionError::InvalidSession(
                    "Fingerprint mismatch".to_string(),
                ));
            }
        }

        Ok(session)
    }

    async fn create_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        user_id: Option<Uuid>,
    ) -> Result<Session, SessionError> {
        let token = gen_random_string(TOKEN_BYTES)?;
        let fingerprint = self
            .fingerprint
            .as_ref()
            .map(|f| f(request))
            .unwrap_or_default();

        let now = Utc::now();
        let mut session = Session::new_at(token, fingerprint, now);
        session.user_id = user_id;
        session.expires_at = self.config.next_expiry(&session, now);

        self.persist_new(&session, response).await?;

        tracing::info!(
            "Created {} session {}",
            if session.is_authenticated() {
                "authenticated"
            } else {
                "anonymous"
            },
            token_prefix(&session.token)
        );
        Ok(session)
    }

    /// Stores a new record and hands its token to the client, removing the
    /// record again if the token cannot be written.
    async fn persist_new(
        &self,
        session: &Session,
        response: &mut HeaderMap,
    ) -> Result<(), SessionError> {
        self.store.create(session).await?;

        let ttl = self.config.idle_timeout(session.is_authenticated());
        if let Err(e) = self.transport.set_token(response, &session.token, ttl) {
            tracing::error!("Failed to set session token, rolling back: {}", e);
            if let Err(rollback) = self.store.delete(&session.token).await {
                tracing::error!("Rollback of session record failed: {}", rollback);
            }
            return Err(e);
        }
        Ok(())
    }
}
