use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{session_id_from_headers, SessionContext, SESSION_COOKIE};
use crate::state::AppState;

/// Resolves the session cookie into a [`SessionContext`] request extension.
/// A cookie that no longer maps to a live session is cleared on the way out
/// unless the handler already set a fresh one.
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut stale_cookie = false;

    if let Some(raw) = session_id_from_headers(request.headers()) {
        match state.sessions.resolve(&raw).await {
            Ok(Some(context)) => {
                request.extensions_mut().insert(context);
            }
            Ok(None) => stale_cookie = true,
            Err(e) => tracing::error!("Session lookup failed: {}", e),
        }
    }

    let mut response = next.run(request).await;

    if stale_cookie && !sets_session_cookie(&response) {
        if let Ok(value) = HeaderValue::from_str(&state.sessions.removal_cookie().to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", SESSION_COOKIE);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

/// The session for this request, if any.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<SessionContext>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(parts.extensions.get::<SessionContext>().cloned()))
    }
}

/// Any signed-in user. Anonymous requests are sent to `/login`.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub SessionContext);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .map(RequireAuth)
            .ok_or_else(|| Redirect::to("/login").into_response())
    }
}

/// A signed-in user whose email is verified according to the current user
/// row. Unverified users are sent to `/verify-email`.
#[derive(Debug, Clone)]
pub struct RequireVerified(pub SessionContext);

#[async_trait]
impl<S> FromRequestParts<S> for RequireVerified
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(session) = RequireAuth::from_request_parts(parts, state).await?;
        if !session.is_email_verified {
            tracing::debug!("User {} blocked pending email verification", session.user_id);
            return Err(Redirect::to("/verify-email").into_response());
        }
        Ok(RequireVerified(session))
    }
}
