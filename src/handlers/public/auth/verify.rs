// handlers/public/auth/verify.rs - GET /verify-email?token=

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::handlers::{render, PageQuery};
use crate::middleware::CurrentSession;
use crate::services::VerificationOutcome;
use crate::state::AppState;
use crate::views::base_context;

pub const MSG_VERIFIED: &str = "Email verification successful! You can now log in to your account.";
pub const MSG_ALREADY_VERIFIED: &str = "Your email is already verified. You can log in to your account.";
pub const MSG_TOKEN_NOT_FOUND: &str = "Invalid or expired verification token.";
pub const MSG_TOKEN_SPENT: &str = "This verification token has expired or has already been used.";

pub async fn verify_email_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    if session.as_ref().is_some_and(|s| s.is_email_verified) {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let token = query.token.as_deref().map(str::trim).unwrap_or("");
    let (message, success) = if token.is_empty() {
        if session.is_some() {
            (
                "Please check your email for the verification link, or request a new one below.",
                false,
            )
        } else {
            ("Invalid verification link. No token provided.", false)
        }
    } else {
        match state.auth().verify_email(token).await {
            Ok(VerificationOutcome::Verified(_)) => (MSG_VERIFIED, true),
            Ok(VerificationOutcome::AlreadyVerified(_)) => (MSG_ALREADY_VERIFIED, true),
            Ok(VerificationOutcome::TokenNotFound) => (MSG_TOKEN_NOT_FOUND, false),
            Ok(VerificationOutcome::TokenInvalid) => (MSG_TOKEN_SPENT, false),
            Ok(VerificationOutcome::UserNotFound) => ("User not found.", false),
            Err(e) => {
                tracing::error!("Email verification failed: {}", e);
                ("Verification failed. Please try again or contact support.", false)
            }
        }
    };

    let mut context = base_context("Verify Email", session.as_ref());
    context.insert("message", message);
    context.insert("success", &success);
    render(&state, "auth/verify_email.html", &context, StatusCode::OK)
}
