#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use tower::ServiceExt;

use bomatrack::auth::hash_password;
use bomatrack::config::AppConfig;
use bomatrack::database::models::User;
use bomatrack::database::repositories::{NewUser, UserRepository};
use bomatrack::database::Database;
use bomatrack::email::MemoryMailer;
use bomatrack::server;
use bomatrack::state::AppState;

pub const PASSWORD: &str = "Passw0rd1";

/// A database whose tables live in a throwaway schema, so tests can run in
/// parallel against one Postgres instance.
pub struct TestDb {
    pub db: Database,
    pub schema: String,
    admin: PgPool,
}

/// `None` (with a note on stderr) when DATABASE_URL is not set.
pub async fn setup() -> Option<TestDb> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL is not set");
        return None;
    };
    match TestDb::create(&url).await {
        Ok(test_db) => Some(test_db),
        Err(e) => panic!("failed to prepare test database: {e:#}"),
    }
}

impl TestDb {
    async fn create(url: &str) -> Result<Self> {
        let schema = format!("bomatrack_test_{}", uuid::Uuid::new_v4().simple());
        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .context("connect admin pool")?;
        admin
            .execute(format!("CREATE SCHEMA {schema}").as_str())
            .await
            .context("create test schema")?;

        let search_path = format!("SET search_path TO {schema}");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(url)
            .await
            .context("connect test pool")?;

        let db = Database::from_pool(pool);
        db.migrate().await.context("migrate test schema")?;
        Ok(Self { db, schema, admin })
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::development()
    }

    pub fn state(&self, mailer: MemoryMailer) -> AppState {
        AppState::with_mailer(self.db.clone(), self.config(), Arc::new(mailer)).expect("app state")
    }

    pub async fn cleanup(self) {
        self.db.close().await;
        let _ = self
            .admin
            .execute(format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema).as_str())
            .await;
        self.admin.close().await;
    }
}

pub async fn create_user(db: &Database, username: &str, email: &str, verified: bool) -> User {
    let users = UserRepository::new(db.clone());
    let user = users
        .create(&NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(PASSWORD).expect("hash"),
            first_name: Some("Test".to_string()),
            last_name: Some("Owner".to_string()),
        })
        .await
        .expect("create user");
    if verified {
        users.mark_email_verified(user.id).await.expect("verify user");
    }
    users.find_by_id(user.id).await.expect("reload user").expect("user exists")
}

pub async fn send(state: &AppState, request: Request<Body>) -> Response {
    server::app(state.clone()).oneshot(request).await.expect("infallible")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// `name=value` of the session cookie set by a response, ready to send back.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("bomatrack_session=") && !v.starts_with("bomatrack_session=;"))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Log in through the real form and return the session cookie.
pub async fn login(state: &AppState, username: &str) -> String {
    let response = send(
        state,
        post_form("/login", &format!("username={username}&password={PASSWORD}"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "login should redirect");
    session_cookie(&response).expect("session cookie")
}
