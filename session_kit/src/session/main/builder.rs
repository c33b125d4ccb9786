use std::sync::Arc;

use chrono::{Duration, Utc};
use http::HeaderMap;

use super::activity::ActivityWorker;
use super::fingerprint::fingerprint_from_headers;
use super::manager::{FingerprintFn, SessionManager};
use crate::cookie::TokenCodec;
use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::storage::SessionStore;
use crate::transport::{CookieTransport, Transport};

/// Collects the parts of a [`SessionManager`] and validates them up front.
///
/// A transport is required unless a cookie codec is supplied, in which case
/// a [`CookieTransport`] is derived from the config.
#[derive(Default)]
pub struct SessionManagerBuilder {
    config: SessionConfig,
    store: Option<Arc<dyn SessionStore>>,
    transport: Option<Arc<dyn Transport>>,
    codec: Option<Arc<dyn TokenCodec>>,
    fingerprint: Option<FingerprintFn>,
}

impl SessionManager {
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::default()
    }
}

impl SessionManagerBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn cookie_codec(mut self, codec: Arc<dyn TokenCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn fingerprint<F>(mut self, fingerprint: F) -> Self
    where
        F: Fn(&HeaderMap) -> String + Send + Sync + 'static,
    {
        self.fingerprint = Some(Arc::new(fingerprint));
        self
    }

    /// Binds sessions to [`fingerprint_from_headers`].
    pub fn default_fingerprint(self) -> Self {
        self.fingerprint(fingerprint_from_headers)
    }

    /// Validates the parts and starts the activity worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<SessionManager, SessionError> {
        let store = self
            .store
            .ok_or_else(|| SessionError::Configuration("No session store configured".to_string()))?;

        let transport = match (self.transport, self.codec) {
            (Some(transport), _) => transport,
            (None, Some(codec)) => {
                Arc::new(CookieTransport::from_config(codec, &self.config)) as Arc<dyn Transport>
            }
            (None, None) => {
                return Err(SessionError::Configuration(
                    "No transport or cookie codec configured".to_string(),
                ));
            }
        };

        validate_config(&self.config)?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SessionError::Configuration(
                "Session manager must be built inside a tokio runtime".to_string(),
            )
        })?;
        let activity =
            ActivityWorker::spawn(store.clone(), self.config.activity_queue_capacity, &runtime);

        tracing::info!(
            "Session manager ready (cookie name: {}, fingerprinting: {})",
            self.config.cookie_name,
            self.fingerprint.is_some()
        );

        Ok(SessionManager {
            store,
            transport,
            config: self.config,
            fingerprint: self.fingerprint,
            activity,
        })
    }

    /// Like [`build`](Self::build) but panics on invalid configuration.
    pub fn must_build(self) -> SessionManager {
        match self.build() {
            Ok(manager) => manager,
            Err(e) => panic!("Failed to build session manager: {e}"),
        }
    }
}

fn validate_config(config: &SessionConfig) -> Result<(), SessionError> {
    if config.cookie_name.is_empty() {
        return Err(SessionError::Configuration(
            "Cookie name must not be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("anonymous idle timeout", config.anonymous_idle_timeout),
        ("anonymous max lifetime", config.anonymous_max_lifetime),
        ("authenticated idle timeout", config.authenticated_idle_timeout),
        ("authenticated max lifetime", config.authenticated_max_lifetime),
    ] {
        if value <= Duration::zero() {
            return Err(SessionError::Configuration(format!(
                "The {name} must be positive"
            )));
        }
        if Utc::now().checked_add_signed(value).is_none() {
            return Err(SessionError::Configuration(format!(
                "The {name} is too large to compute an expiry"
            )));
        }
    }

    if config.activity_queue_capacity == 0 {
        return Err(SessionError::Configuration(
            "Activity queue capacity must be positive".to_string(),
        ));
    }
    Ok(())
}
