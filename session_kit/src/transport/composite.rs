use std::sync::Arc;

use chrono::Duration;
use http::HeaderMap;

use crate::session::SessionError;
use crate::transport::types::Transport;

/// Ordered list of transports.
///
/// Reads take the first transport that yields a token; writes go to all of
/// them. Writes are best-effort: every transport is attempted and the last
/// failure is reported, nothing is rolled back.
#[derive(Clone, Default)]
pub struct CompositeTransport {
    transports: Vec<Arc<dyn Transport>>,
}

impl CompositeTransport {
    pub fn new(transports: Vec<Arc<dyn Transport>>) -> Self {
        Self { transports }
    }

    pub fn with(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.push(transport);
        self
    }

    pub fn len(&self) -> usize {
        self.transports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }
}

impl Transport for CompositeTransport {
    fn get_token(&self, request: &HeaderMap) -> Result<String, SessionError> {
        self.transports
            .iter()
            .find_map(|transport| {
                transport
                    .get_token(request)
                    .ok()
                    .filter(|token| !token.is_empty())
            })
            .ok_or(SessionError::SessionNotFound)
    }

    fn set_token(
        &self,
        response: &mut HeaderMap,
        token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let mut result = Ok(());
        for transport in &self.transports {
            if let Err(e) = transport.set_token(response, token, ttl) {
                tracing::warn!("Transport failed to set session token: {}", e);
                result = Err(e);
            }
        }
        result
    }

    fn clear_token(&self, response: &mut HeaderMap) -> Result<(), SessionError> {
        let mut result = Ok(());
        for transport in &self.transports {
            if let Err(e) = transport.clear_token(response) {
                tracing::warn!("Transport failed to clear session token: {}", e);
                result = Err(e);
            }
        }
        result
    }
}
