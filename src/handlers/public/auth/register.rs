// handlers/public/auth/register.rs - GET/POST /register

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::error::{AppError, FieldErrors};
use crate::handlers::forms::RegisterForm;
use crate::handlers::render;
use crate::middleware::CurrentSession;
use crate::services::{AuthError, RegistrationInput, TokenDelivery};
use crate::state::AppState;
use crate::views::base_context;

pub const MSG_REGISTERED: &str =
    "Registration successful! Please check your email to verify your account before logging in.";
pub const MSG_EMAIL_NOT_SENT: &str =
    "Account created but verification email could not be sent. Please contact support.";
pub const MSG_TOKEN_NOT_ISSUED: &str =
    "Account created but verification token could not be generated. Please contact support.";

fn register_page(
    state: &AppState,
    form: &RegisterForm,
    errors: &FieldErrors,
    status: StatusCode,
) -> Result<Response, AppError> {
    let mut context = base_context("Register", None);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "auth/register.html", &context, status)
}

pub async fn register_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    if session.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    register_page(&state, &RegisterForm::default(), &FieldErrors::new(), StatusCode::OK)
}

pub async fn register_post(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if session.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let input = RegistrationInput {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        confirm_password: form.confirm_password.clone(),
        first_name: Some(form.first_name.clone()),
        last_name: Some(form.last_name.clone()),
    };

    let registration = match state.auth().register(input).await {
        Ok(registration) => registration,
        Err(AuthError::Validation(errors)) => {
            return register_page(&state, &form, &errors, StatusCode::BAD_REQUEST);
        }
        Err(e) => {
            tracing::error!("Registration failed: {}", e);
            let errors = FieldErrors::from([("general".to_string(), "Registration failed. Please try again.".to_string())]);
            return register_page(&state, &form, &errors, StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    tracing::info!(
        "Registered user {} ({:?})",
        registration.user.id,
        registration.delivery
    );
    let (message, success) = match registration.delivery {
        TokenDelivery::Sent => (MSG_REGISTERED, true),
        TokenDelivery::EmailFailed => (MSG_EMAIL_NOT_SENT, false),
        TokenDelivery::TokenFailed => (MSG_TOKEN_NOT_ISSUED, false),
    };

    let mut context = base_context("Registration", None);
    context.insert("message", message);
    context.insert("success", &success);
    context.insert("email", &registration.user.email);
    render(&state, "auth/register_success.html", &context, StatusCode::OK)
}
