//! Routing behavior that needs no live database: the pool is lazy and points
//! at a closed port, so any query fails fast.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use sqlx::postgres::PgPoolOptions;

use bomatrack::config::AppConfig;
use bomatrack::database::Database;
use bomatrack::email::MemoryMailer;
use bomatrack::state::AppState;

fn offline_state() -> AppState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy("postgres://bomatrack@127.0.0.1:1/bomatrack")
        .unwrap();
    AppState::with_mailer(
        Database::from_pool(pool),
        AppConfig::development(),
        Arc::new(MemoryMailer::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn unknown_route_is_plain_text_404() {
    let state = offline_state();
    let response = common::send(&state, common::get("/nowhere", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        common::body_text(response).await,
        "404 - Not Found\nRoute not found for GET /nowhere"
    );
}

#[tokio::test]
async fn wrong_method_is_the_same_404() {
    let state = offline_state();
    let response = common::send(&state, common::post_form("/dashboard", "", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        common::body_text(response).await,
        "404 - Not Found\nRoute not found for POST /dashboard"
    );
}

#[tokio::test]
async fn trailing_slash_is_stripped() {
    let state = offline_state();
    let response = common::send(&state, common::get("/login/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response).await.contains("Log in"));
}

#[tokio::test]
async fn anonymous_owner_pages_redirect_to_login() {
    let state = offline_state();
    for path in ["/", "/dashboard", "/properties", "/units/create", "/profile"] {
        let response = common::send(&state, common::get(path, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(common::location(&response), "/login", "{path}");
    }
}

#[tokio::test]
async fn login_validation_errors_rerender_the_form() {
    let state = offline_state();
    let response = common::send(&state, common::post_form("/login", "username=&password=", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::body_text(response).await.contains("Username or email is required"));
}

#[tokio::test]
async fn verify_without_token_explains_itself() {
    let state = offline_state();
    let response = common::send(&state, common::get("/verify-email", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response)
        .await
        .contains("Invalid verification link. No token provided."));
}

#[tokio::test]
async fn reset_pages_render_without_a_token() {
    let state = offline_state();
    let response = common::send(&state, common::get("/forgot-password", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::body_text(response).await.contains("Forgot your password?"));

    let response = common::send(&state, common::get("/reset-password", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::body_text(response)
        .await
        .contains("This password reset link is invalid or has expired."));

    let response = common::send(
        &state,
        common::post_form("/forgot-password", "email=not-an-email", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::body_text(response).await.contains("Please enter a valid email address."));
}

#[tokio::test]
async fn failed_session_lookup_is_treated_as_anonymous() {
    let state = offline_state();
    let response = common::send(
        &state,
        common::get("/dashboard", Some("bomatrack_session=0123456789abcdef")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/login");
    // An outage is not a stale cookie; the browser keeps it.
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let state = offline_state();
    let port = portpicker::pick_unused_port().expect("free port");
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    tokio::spawn(bomatrack::server::serve(listener, state));

    let response = reqwest::get(format!("http://127.0.0.1:{port}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["database"], "disconnected");
}
