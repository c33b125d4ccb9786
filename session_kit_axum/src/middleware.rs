use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::HeaderMap;
use session_kit::SessionManager;

use super::context::attach_session;

/// Appends the headers produced by the session layer to a response.
pub fn append_session_headers(response: &mut Response, headers: &HeaderMap) {
    let target = response.headers_mut();
    for (name, value) in headers {
        target.append(name.clone(), value.clone());
    }
}

/// Attaches the request's session when there is a valid one.
///
/// Never rejects: a missing, expired or foreign session just leaves the
/// request without one.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use axum::{Router, middleware::from_fn_with_state, routing::get};
/// # use session_kit::SessionManager;
/// # fn app(manager: Arc<SessionManager>) -> Router {
/// Router::new()
///     .route("/", get(|| async { "hello" }))
///     .layer(from_fn_with_state(manager, session_kit_axum::session_middleware))
/// # }
/// ```
pub async fn session_middleware(
    State(manager): State<Arc<SessionManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    match manager.get(req.headers()).await {
        Ok(mut session) => {
            manager.track_activity(&mut session);
            attach_session(req.extensions_mut(), session);
        }
        Err(e) => tracing::trace!("Continuing without session: {}", e),
    }
    next.run(req).await
}

/// Answers 401 unless the request carries a valid authenticated session.
pub async fn require_auth(
    State(manager): State<Arc<SessionManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    match manager.get(req.headers()).await {
        Ok(mut session) if session.is_authenticated() => {
            manager.track_activity(&mut session);
            attach_session(req.extensions_mut(), session);
            next.run(req).await
        }
        Ok(_) => {
            tracing::debug!("Anonymous session on a route requiring authentication");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
        Err(e) => {
            tracing::debug!("Rejecting unauthenticated request: {}", e);
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

/// Attaches the request's session, creating an anonymous one if needed.
///
/// Answers 500 only when a session cannot be created.
pub async fn ensure_session(
    State(manager): State<Arc<SessionManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut session_headers = HeaderMap::new();
    match manager.ensure(req.headers(), &mut session_headers).await {
        Ok(session) => {
            attach_session(req.extensions_mut(), session);
            let mut response = next.run(req).await;
            append_session_headers(&mut response, &session_headers);
            response
        }
        Err(e) => {
            tracing::error!("Failed to establish session: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to establish session").into_response()
        }
    }
}
