use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Response},
};
use http::{Extensions, Request, StatusCode, request::Parts};
use session_kit::Session;
use std::convert::Infallible;
use uuid::Uuid;

/// Request extension holding the current session. Private so that nothing
/// outside this crate can insert or shadow it.
#[derive(Clone)]
struct SessionContext(Session);

/// Attaches `session` to a request's extensions, replacing any earlier one.
pub fn attach_session(extensions: &mut Extensions, session: Session) {
    extensions.insert(SessionContext(session));
}

pub fn session_from_extensions(extensions: &Extensions) -> Option<&Session> {
    extensions.get::<SessionContext>().map(|context| &context.0)
}

/// Session attached by one of the session middlewares, if any.
pub fn session_from_request<B>(request: &Request<B>) -> Option<&Session> {
    session_from_extensions(request.extensions())
}

/// Like [`session_from_request`] but panics when no session is attached.
///
/// Only for handlers behind `require_auth` or `ensure_session`.
pub fn must_session<B>(request: &Request<B>) -> &Session {
    match session_from_request(request) {
        Some(session) => session,
        None => panic!("No session in request context; is the session middleware installed?"),
    }
}

/// User id of the attached session, if it is authenticated.
pub fn user_id_from_request<B>(request: &Request<B>) -> Option<Uuid> {
    session_from_request(request).and_then(|session| session.user_id)
}

/// Rejection for extractors that need a session the middleware did not attach.
#[derive(Debug)]
pub struct SessionRejection;

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        tracing::debug!("Rejecting request without a usable session");
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    }
}

/// Session attached to the request, available as an Axum extractor
///
/// The session is a detached copy: changes are not persisted unless handed
/// back to the [`SessionManager`](session_kit::SessionManager).
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use session_kit_axum::CurrentSession;
///
/// async fn handler(CurrentSession(session): CurrentSession) -> String {
///     format!("Session {}", session.id())
/// }
///
/// let app: Router = Router::new().route("/", get(handler));
/// ```
#[derive(Clone, Debug)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        session_from_extensions(&parts.extensions)
            .cloned()
            .map(CurrentSession)
            .ok_or(SessionRejection)
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(session_from_extensions(&parts.extensions)
            .cloned()
            .map(CurrentSession))
    }
}

/// User id of an authenticated session, available as an Axum extractor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUserId(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUserId
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        session_from_extensions(&parts.extensions)
            .and_then(|session| session.user_id)
            .map(CurrentUserId)
            .ok_or(SessionRejection)
    }
}
