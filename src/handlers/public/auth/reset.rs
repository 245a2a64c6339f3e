// handlers/public/auth/reset.rs - GET/POST /forgot-password, GET/POST /reset-password

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::error::{AppError, FieldErrors};
use crate::handlers::forms::{EmailForm, ResetPasswordForm};
use crate::handlers::{render, PageQuery};
use crate::middleware::CurrentSession;
use crate::services::auth_service::MSG_RESET_LINK_INVALID;
use crate::services::{AuthError, PasswordResetOutcome, ResetRequestOutcome};
use crate::state::AppState;
use crate::views::base_context;

const MSG_RESET_REQUESTED: &str = "If an account exists for that email, a password reset link is on its way.";

fn forgot_page(state: &AppState, email: &str, message: Option<&str>, success: bool) -> Result<Response, AppError> {
    let mut context = base_context("Forgot Password", None);
    context.insert("email", email);
    context.insert("message", &message);
    context.insert("success", &success);
    let status = if message.is_some() && !success {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    render(state, "auth/forgot_password.html", &context, status)
}

struct ResetPage<'a> {
    token: &'a str,
    token_valid: bool,
    errors: &'a FieldErrors,
    error: Option<&'a str>,
    status: StatusCode,
}

fn reset_page(state: &AppState, page: ResetPage<'_>) -> Result<Response, AppError> {
    let mut context = base_context("Reset Password", None);
    context.insert("token", page.token);
    context.insert("token_valid", &page.token_valid);
    context.insert("errors", page.errors);
    context.insert("error", &page.error);
    render(state, "auth/reset_password.html", &context, page.status)
}

fn invalid_link(state: &AppState) -> Result<Response, AppError> {
    reset_page(
        state,
        ResetPage {
            token: "",
            token_valid: false,
            errors: &FieldErrors::new(),
            error: Some(MSG_RESET_LINK_INVALID),
            status: StatusCode::BAD_REQUEST,
        },
    )
}

pub async fn forgot_password_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    if session.is_some() {
        return Ok(Redirect::to("/profile").into_response());
    }
    forgot_page(&state, "", None, false)
}

pub async fn forgot_password_post(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();
    match state.auth().request_password_reset(email).await {
        Ok(ResetRequestOutcome::Sent | ResetRequestOutcome::UnknownEmail) => {
            forgot_page(&state, email, Some(MSG_RESET_REQUESTED), true)
        }
        Ok(ResetRequestOutcome::DeliveryFailed) => forgot_page(
            &state,
            email,
            Some("Failed to send password reset email. Please try again."),
            false,
        ),
        Err(AuthError::Validation(errors)) => {
            let message = errors.get("email").cloned().unwrap_or_default();
            forgot_page(&state, email, Some(&message), false)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn reset_password_get(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let token = query.token.unwrap_or_default();
    if !state.auth().reset_token_is_valid(&token).await? {
        return invalid_link(&state);
    }
    reset_page(
        &state,
        ResetPage {
            token: token.trim(),
            token_valid: true,
            errors: &FieldErrors::new(),
            error: None,
            status: StatusCode::OK,
        },
    )
}

pub async fn reset_password_post(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let result = state
        .auth()
        .reset_password(&form.token, &form.new_password, &form.confirm_password)
        .await;

    match result {
        Ok(PasswordResetOutcome::Reset { .. }) => Ok(Redirect::to("/login?reset=1").into_response()),
        Ok(PasswordResetOutcome::TokenInvalid) => invalid_link(&state),
        Err(AuthError::Validation(errors)) => reset_page(
            &state,
            ResetPage {
                token: form.token.trim(),
                token_valid: true,
                errors: &errors,
                error: None,
                status: StatusCode::BAD_REQUEST,
            },
        ),
        Err(e) => Err(e.into()),
    }
}
