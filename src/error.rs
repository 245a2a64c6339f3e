// Handler-facing error taxonomy
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use thiserror::Error;

use crate::auth::PasswordError;
use crate::database::DatabaseError;
use crate::email::MailError;
use crate::views::ViewError;

/// Per-field messages shown next to form inputs.
pub type FieldErrors = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed form input; nothing was persisted.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Record absent or outside the caller's ownership chain. The two are
    /// indistinguishable to the client.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication required")]
    Unauthorized,

    #[error(transparent)]
    Persistence(#[from] DatabaseError),

    #[error(transparent)]
    Delivery(#[from] MailError),

    #[error(transparent)]
    Render(#[from] ViewError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), message.into());
        AppError::Validation(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::SEE_OTHER,
            AppError::Delivery(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) | AppError::Render(_) | AppError::Password(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Delivery(_) => "DELIVERY_ERROR",
            AppError::Render(_) => "RENDER_ERROR",
            AppError::Password(_) => "PASSWORD_ERROR",
        }
    }
}

/// Plain-text body used for unmatched routes and missing records.
pub fn not_found_body(method: &str, path: &str) -> String {
    format!("404 - Not Found\nRoute not found for {} {}", method, path)
}

const GENERIC_FAILURE_PAGE: &str = "<!DOCTYPE html><html><head><title>BomaTrack</title></head>\
<body><h1>Something went wrong</h1><p>We could not complete your request. Please try again.</p>\
<p><a href=\"/dashboard\">Back to dashboard</a></p></body></html>";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Unauthorized => return Redirect::to("/login").into_response(),
            AppError::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                return (StatusCode::NOT_FOUND, "404 - Not Found").into_response();
            }
            AppError::Validation(errors) => {
                tracing::debug!("Unhandled validation errors: {:?}", errors);
                let body = errors
                    .iter()
                    .map(|(field, message)| format!("{}: {}", field, message))
                    .collect::<Vec<_>>()
                    .join("\n");
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            // Real cause stays in the server log; the client gets a generic page.
            AppError::Persistence(e) => tracing::error!("Persistence failure: {}", e),
            AppError::Delivery(e) => tracing::error!("Mail delivery failure: {}", e),
            AppError::Render(e) => tracing::error!("Template rendering failure: {}", e),
            AppError::Password(e) => tracing::error!("Password hashing failure: {}", e),
        }

        (self.status_code(), Html(GENERIC_FAILURE_PAGE)).into_response()
    }
}
