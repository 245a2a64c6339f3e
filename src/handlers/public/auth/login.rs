// handlers/public/auth/login.rs - GET/POST /login

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::error::AppError;
use crate::handlers::forms::LoginForm;
use crate::handlers::{redirect_with_cookie, render, PageQuery};
use crate::middleware::CurrentSession;
use crate::services::auth_service::{MSG_LOGIN_INVALID, MSG_LOGIN_UNVERIFIED};
use crate::services::{AuthError, LoginOutcome};
use crate::state::AppState;
use crate::views::base_context;

fn login_page(
    state: &AppState,
    identifier: &str,
    error: Option<String>,
    success: Option<String>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let mut context = base_context("Login", None);
    context.insert("identifier", identifier);
    context.insert("error", &error);
    context.insert("success", &success);
    render(state, "auth/login.html", &context, status)
}

pub async fn login_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    if session.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    let success = if query.deleted.is_some() {
        Some("Your account has been deleted.".to_string())
    } else if query.reset.is_some() {
        Some("Your password has been reset. Please log in.".to_string())
    } else {
        None
    };
    login_page(&state, "", None, success, StatusCode::OK)
}

pub async fn login_post(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if session.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let outcome = match state.auth().login(&form.username, &form.password).await {
        Ok(outcome) => outcome,
        Err(AuthError::Validation(errors)) => {
            let message = errors.get("username").or_else(|| errors.get("password")).cloned();
            return login_page(&state, form.username.trim(), message, None, StatusCode::BAD_REQUEST);
        }
        Err(e) => return Err(e.into()),
    };

    match outcome {
        LoginOutcome::Authenticated(user) => {
            let cookie = state.sessions.start(&user).await?;
            tracing::info!("User {} logged in", user.id);
            Ok(redirect_with_cookie("/dashboard", cookie))
        }
        LoginOutcome::Unverified => login_page(
            &state,
            form.username.trim(),
            Some(MSG_LOGIN_UNVERIFIED.to_string()),
            None,
            StatusCode::FORBIDDEN,
        ),
        LoginOutcome::InvalidCredentials => login_page(
            &state,
            form.username.trim(),
            Some(MSG_LOGIN_INVALID.to_string()),
            None,
            StatusCode::UNAUTHORIZED,
        ),
    }
}
