// handlers/public/auth/resend.rs - GET/POST /resend-verification

use axum::{extract::State, http::StatusCode, response::Response, Form};

use crate::error::AppError;
use crate::handlers::forms::EmailForm;
use crate::handlers::render;
use crate::middleware::CurrentSession;
use crate::services::{AuthError, ResendOutcome};
use crate::state::AppState;
use crate::views::base_context;

fn resend_page(
    state: &AppState,
    session: Option<&crate::auth::SessionContext>,
    email: &str,
    message: Option<&str>,
    success: bool,
) -> Result<Response, AppError> {
    let mut context = base_context("Resend Verification", session);
    context.insert("email", email);
    context.insert("message", &message);
    context.insert("success", &success);
    render(state, "auth/resend_verification.html", &context, StatusCode::OK)
}

pub async fn resend_verification_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    let email = session.as_ref().map(|s| s.email.clone()).unwrap_or_default();
    resend_page(&state, session.as_ref(), &email, None, false)
}

pub async fn resend_verification_post(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<EmailForm>,
) -> Result<Response, AppError> {
    let (message, success) = match state.auth().resend_verification(&form.email).await {
        Ok(ResendOutcome::Sent) => ("Verification email sent! Please check your inbox.".to_string(), true),
        Ok(ResendOutcome::DeliveryFailed) => ("Failed to send verification email. Please try again.".to_string(), false),
        Ok(ResendOutcome::TokenFailed) => (
            "Failed to generate verification token. Please try again.".to_string(),
            false,
        ),
        Ok(ResendOutcome::UnknownEmail) => ("No account found with this email address.".to_string(), false),
        Ok(ResendOutcome::AlreadyVerified) => (
            "This email is already verified. You can log in to your account.".to_string(),
            true,
        ),
        Err(AuthError::Validation(errors)) => (errors.get("email").cloned().unwrap_or_default(), false),
        Err(e) => return Err(e.into()),
    };
    resend_page(&state, session.as_ref(), form.email.trim(), Some(&message), success)
}
