use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use session_kit_axum::{CurrentSession, CurrentUserId, IntoResponseError, SessionManager};

#[derive(Serialize)]
pub(crate) struct SessionInfo {
    id: Uuid,
    user_id: Option<Uuid>,
    authenticated: bool,
    visits: i64,
    expires_at: String,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct LoginRequest {
    /// Demo only: any id is accepted, a random one when absent.
    user_id: Option<Uuid>,
}

// Behind ensure_session: every visitor has a session here
pub(crate) async fn index(
    State(manager): State<Arc<SessionManager>>,
    CurrentSession(mut session): CurrentSession,
) -> Response {
    let visits = session.get_int("visits").unwrap_or(0) + 1;
    session.set("visits", visits);
    if let Err(e) = manager.save(&session).await {
        tracing::warn!("Failed to save visit counter: {}", e);
    }

    let who = match session.user_id {
        Some(user) => format!("user {user}"),
        None => "an anonymous visitor".to_string(),
    };
    Html(format!(
        "<p>Hello, {who}. This is visit number {visits} in this session.</p>\
         <p>POST /login to authenticate, GET /protected afterwards, POST /logout to end the session.</p>"
    ))
    .into_response()
}

// Behind session_middleware: the session is optional
pub(crate) async fn whoami(session: Option<CurrentSession>) -> Response {
    match session {
        Some(CurrentSession(session)) => Json(SessionInfo {
            id: session.id(),
            user_id: session.user_id,
            authenticated: session.is_authenticated(),
            visits: session.get_int("visits").unwrap_or(0),
            expires_at: session.expires_at.to_rfc3339(),
        })
        .into_response(),
        None => (StatusCode::OK, Json(serde_json::json!({ "session": null }))).into_response(),
    }
}

pub(crate) async fn login(
    State(manager): State<Arc<SessionManager>>,
    headers: HeaderMap,
    request: Option<Json<LoginRequest>>,
) -> Result<Response, (StatusCode, String)> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let user_id = request.user_id.unwrap_or_else(Uuid::new_v4);

    let mut response_headers = HeaderMap::new();
    let session = manager
        .authenticate(&headers, &mut response_headers, user_id)
        .await
        .into_response_error()?;

    tracing::info!("User {} logged in", user_id);
    Ok((
        response_headers,
        Json(serde_json::json!({
            "user_id": user_id,
            "session_id": session.id(),
        })),
    )
        .into_response())
}

pub(crate) async fn logout(
    State(manager): State<Arc<SessionManager>>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, String)> {
    let mut response_headers = HeaderMap::new();
    manager
        .destroy(&headers, &mut response_headers)
        .await
        .into_response_error()?;

    Ok((response_headers, Html("Logged out")).into_response())
}

pub(crate) async fn logout_everywhere(
    State(manager): State<Arc<SessionManager>>,
    CurrentUserId(user_id): CurrentUserId,
) -> Result<Response, (StatusCode, String)> {
    let removed = manager
        .delete_user_sessions(user_id)
        .await
        .into_response_error()?;

    Ok(Json(serde_json::json!({ "sessions_removed": removed })).into_response())
}

// Behind require_auth: only authenticated sessions get here
pub(crate) async fn protected(CurrentUserId(user_id): CurrentUserId) -> impl IntoResponse {
    Html(format!("<p>Protected page for user {user_id}</p>"))
}

pub(crate) async fn refresh(
    State(manager): State<Arc<SessionManager>>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, String)> {
    let mut response_headers = HeaderMap::new();
    let session = manager
        .refresh(&headers, &mut response_headers)
        .await
        .into_response_error()?;

    Ok((
        response_headers,
        Json(serde_json::json!({ "expires_at": session.expires_at.to_rfc3339() })),
    )
        .into_response())
}
