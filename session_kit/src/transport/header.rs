use chrono::{Duration, SecondsFormat, Utc};
use http::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

use crate::session::{SessionConfig, SessionError};
use crate::transport::types::Transport;

pub const DEFAULT_TOKEN_PREFIX: &str = "Bearer ";

/// Carries the token in a request/response header, for API clients that
/// store and replay the value themselves.
///
/// Setting a token with a positive TTL also writes `<Header>-Expires` with an
/// RFC 3339 timestamp. It is advisory only; the store stays authoritative.
#[derive(Debug, Clone)]
pub struct HeaderTransport {
    header: HeaderName,
    expires_header: HeaderName,
    prefix: String,
}

impl Default for HeaderTransport {
    fn default() -> Self {
        Self {
            header: AUTHORIZATION,
            expires_header: HeaderName::from_static("authorization-expires"),
            prefix: DEFAULT_TOKEN_PREFIX.to_string(),
        }
    }
}

impl HeaderTransport {
    pub fn new(header: &str) -> Result<Self, SessionError> {
        let parse = |name: &str| {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                SessionError::Configuration(format!("Invalid header name: {name:?}"))
            })
        };

        Ok(Self {
            header: parse(header)?,
            expires_header: parse(&format!("{header}-Expires"))?,
            prefix: DEFAULT_TOKEN_PREFIX.to_string(),
        })
    }

    /// Uses the configured session name as the header name.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        Self::new(&config.cookie_name)
    }

    /// Replaces the value prefix; an empty prefix sends the bare token.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header
    }

    pub fn expires_header_name(&self) -> &HeaderName {
        &self.expires_header
    }
}

impl Transport for HeaderTransport {
    fn get_token(&self, request: &HeaderMap) -> Result<String, SessionError> {
        let raw = request
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .ok_or(SessionError::SessionNotFound)?;

        let token = raw.strip_prefix(self.prefix.as_str()).unwrap_or(raw).trim();
        if token.is_empty() {
            return Err(SessionError::SessionNotFound);
        }
        Ok(token.to_string())
    }

    fn set_token(
        &self,
        response: &mut HeaderMap,
        token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let value = HeaderValue::from_str(&format!("{}{token}", self.prefix))
            .map_err(|_| SessionError::InvalidSession("Token is not a valid header value".into()))?;
        response.insert(self.header.clone(), value);

        let expires_at = Some(ttl)
            .filter(|ttl| *ttl > Duration::zero())
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        if let Some(expires_at) = expires_at {
            let expires = expires_at.to_rfc3339_opts(SecondsFormat::Secs, true);
            let value = HeaderValue::from_str(&expires).map_err(|_| {
                SessionError::Configuration("Expiry is not a valid header value".into())
            })?;
            response.insert(self.expires_header.clone(), value);
        } else {
            response.remove(&self.expires_header);
        }
        Ok(())
    }

    fn clear_token(&self, response: &mut HeaderMap) -> Result<(), SessionError> {
        // An empty value tells the client to forget the token
        response.insert(self.header.clone(), HeaderValue::from_static(""));
        response.remove(&self.expires_header);
        Ok(())
    }
}
