use std::sync::Arc;

use chrono::Duration;
use http::HeaderMap;

use crate::cookie::{
    CookieOptions, TokenCodec, delete_cookie, get_encrypted_cookie, set_encrypted_cookie,
};
use crate::session::{SessionConfig, SessionError};
use crate::transport::types::Transport;

/// Carries the token in an encrypted cookie.
pub struct CookieTransport {
    codec: Arc<dyn TokenCodec>,
    options: CookieOptions,
}

impl CookieTransport {
    pub fn new(codec: Arc<dyn TokenCodec>, options: CookieOptions) -> Self {
        Self { codec, options }
    }

    /// Uses the cookie name and attributes of `config`.
    pub fn from_config(codec: Arc<dyn TokenCodec>, config: &SessionConfig) -> Self {
        Self::new(codec, config.cookie_options())
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }
}

impl Transport for CookieTransport {
    fn get_token(&self, request: &HeaderMap) -> Result<String, SessionError> {
        match get_encrypted_cookie(request, self.codec.as_ref(), &self.options.name) {
            Ok(Some(token)) if !token.is_empty() => Ok(token),
            Ok(_) => Err(SessionError::SessionNotFound),
            Err(e) => {
                // Tampered, foreign-key or garbage cookies all read as "no token"
                tracing::debug!("Discarding undecryptable session cookie: {}", e);
                Err(SessionError::SessionNotFound)
            }
        }
    }

    fn set_token(
        &self,
        response: &mut HeaderMap,
        token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let mut options = self.options.clone();
        options.max_age = (ttl > Duration::zero()).then_some(ttl);
        set_encrypted_cookie(response, self.codec.as_ref(), &options, token)?;
        Ok(())
    }

    fn clear_token(&self, response: &mut HeaderMap) -> Result<(), SessionError> {
        delete_cookie(response, &self.options)?;
        Ok(())
    }
}
