// handlers/public/auth/logout.rs - GET/POST /logout

use axum::{extract::State, response::Response};

use crate::error::AppError;
use crate::handlers::redirect_with_cookie;
use crate::middleware::CurrentSession;
use crate::state::AppState;

/// Ends the session unconditionally; anonymous callers just get the cookie
/// cleared.
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    let cookie = match session {
        Some(session) => {
            tracing::info!("User {} logged out", session.user_id);
            state.sessions.end(&session).await?
        }
        None => state.sessions.removal_cookie().to_string(),
    };
    Ok(redirect_with_cookie("/login", cookie))
}
