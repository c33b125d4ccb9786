//! session-kit-axum - Axum integration for session-kit
//!
//! Three middlewares built on a shared [`SessionManager`]:
//! [`session_middleware`] (optional), [`require_auth`] and
//! [`ensure_session`]. Install them with
//! `axum::middleware::from_fn_with_state(manager, ...)` and read the session
//! in handlers through [`CurrentSession`], [`CurrentUserId`] or the request
//! context helpers.

mod context;
mod error;
mod middleware;

#[cfg(test)]
mod test_utils;

pub use context::{
    CurrentSession, CurrentUserId, SessionRejection, attach_session, must_session,
    session_from_extensions, session_from_request, user_id_from_request,
};
pub use error::IntoResponseError;
pub use middleware::{append_session_headers, ensure_session, require_auth, session_middleware};

// Re-export the core crate so applications need a single dependency
pub use session_kit;
pub use session_kit::{
    CompositeTransport, CookieCodec, CookieTransport, HeaderTransport, InMemorySessionStore,
    Session, SessionConfig, SessionError, SessionManager, SessionManagerBuilder, SessionStore,
    fingerprint_from_headers,
};
