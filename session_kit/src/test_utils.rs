//! Shared fixtures for unit tests

use std::sync::Arc;

use http::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};

use crate::cookie::CookieCodec;
use crate::session::{SessionConfig, SessionManager};
use crate::storage::InMemorySessionStore;

pub(crate) const TEST_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

pub(crate) fn test_codec() -> Arc<CookieCodec> {
    Arc::new(CookieCodec::new(TEST_SECRET).expect("test secret is long enough"))
}

/// Manager over a fresh in-memory store with a cookie transport.
pub(crate) fn test_manager(config: SessionConfig) -> (SessionManager, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let manager = SessionManager::builder()
        .config(config)
        .store(store.clone())
        .cookie_codec(test_codec())
        .build()
        .expect("test manager builds");
    (manager, store)
}

pub(crate) fn request_with_cookie(name: &str, value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("{name}={value}")).expect("valid cookie header"),
    );
    headers
}

pub(crate) fn set_cookie_headers(response: &HeaderMap) -> Vec<String> {
    response
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Value of the last `Set-Cookie` for `name` in a response.
pub(crate) fn cookie_value(response: &HeaderMap, name: &str) -> Option<String> {
    set_cookie_headers(response)
        .iter()
        .rev()
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (cookie_name, value) = pair.split_once('=')?;
            (cookie_name.trim() == name).then(|| value.trim().to_string())
        })
        .next()
}

/// Turns the session cookie of a response into the headers of a follow-up
/// request.
pub(crate) fn follow_up(response: &HeaderMap, name: &str) -> HeaderMap {
    let value = cookie_value(response, name).expect("response sets the session cookie");
    request_with_cookie(name, &value)
}
