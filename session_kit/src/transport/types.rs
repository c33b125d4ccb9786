use chrono::Duration;
use http::HeaderMap;

use crate::session::SessionError;

/// Moves a session token between client and server.
///
/// Reads happen on the inbound request headers, writes on the outbound
/// response headers.
pub trait Transport: Send + Sync + 'static {
    /// Fails with [`SessionError::SessionNotFound`] when no usable token is present.
    fn get_token(&self, request: &HeaderMap) -> Result<String, SessionError>;

    /// `ttl` is the lifetime hint for the client; zero or negative means none.
    fn set_token(
        &self,
        response: &mut HeaderMap,
        token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    fn clear_token(&self, response: &mut HeaderMap) -> Result<(), SessionError>;
}
