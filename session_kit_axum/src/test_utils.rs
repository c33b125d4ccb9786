//! Shared fixtures for axum integration tests

use std::sync::Arc;

use axum::{body::Body, extract::Request, response::Response};
use http::header::{COOKIE, HeaderMap, SET_COOKIE};
use http_body_util::BodyExt;
use session_kit::{CookieCodec, InMemorySessionStore, SessionManager};

pub(crate) fn test_manager() -> Arc<SessionManager> {
    let codec = CookieCodec::new(b"0123456789abcdef0123456789abcdef").unwrap();
    let manager = SessionManager::builder()
        .store(Arc::new(InMemorySessionStore::new()))
        .cookie_codec(Arc::new(codec))
        .build()
        .unwrap();
    Arc::new(manager)
}

/// GET request, optionally carrying a `Cookie` header.
pub(crate) fn request(uri: &str, cookie: Option<&str>) -> Request {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub(crate) fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// `name=value` of the last `Set-Cookie` in a header map, ready to send back.
pub(crate) fn cookie_header(headers: &HeaderMap) -> String {
    let set_cookie = headers
        .get_all(SET_COOKIE)
        .iter()
        .last()
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub(crate) async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
