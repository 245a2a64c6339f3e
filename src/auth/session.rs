use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use serde::Serialize;

use crate::auth::token::{generate_token, sha256_hex};
use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Session, User};
use crate::database::repositories::{SessionRepository, UserRepository};

pub const SESSION_COOKIE: &str = "bomatrack_session";

/// Authenticated identity for one request, always taken from the current
/// user row rather than from what was stored at login.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    #[serde(skip)]
    pub session_id: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub is_email_verified: bool,
}

impl SessionContext {
    fn new(session_id: String, user: &User) -> Self {
        Self {
            session_id,
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_email_verified: user.is_email_verified,
        }
    }
}

fn identity_changed(session: &Session, user: &User) -> bool {
    session.is_email_verified != user.is_email_verified
        || session.username != user.username
        || session.email != user.email
}

/// Server-side session lifecycle plus the cookie that carries the id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: SessionRepository,
    users: UserRepository,
    ttl: Duration,
    secure: bool,
}

impl SessionStore {
    pub fn new(db: Database, ttl_hours: i64, secure: bool) -> Self {
        Self {
            sessions: SessionRepository::new(db.clone()),
            users: UserRepository::new(db),
            ttl: Duration::hours(ttl_hours.max(1)),
            secure,
        }
    }

    /// Persist a session for `user` and return the `Set-Cookie` value.
    pub async fn start(&self, user: &User) -> Result<String, DatabaseError> {
        let raw = generate_token();
        let expires_at = Utc::now() + self.ttl;
        self.sessions.create(&sha256_hex(&raw), user, expires_at).await?;
        tracing::debug!("Started session for user {}", user.id);
        Ok(self.cookie(raw).to_string())
    }

    /// Drop the session row. Returns the `Set-Cookie` value that clears the
    /// browser side.
    pub async fn end(&self, session: &SessionContext) -> Result<String, DatabaseError> {
        self.sessions.delete(&session.session_id).await?;
        Ok(self.removal_cookie().to_string())
    }

    pub async fn end_all_for_user(&self, user_id: i64) -> Result<u64, DatabaseError> {
        self.sessions.delete_for_user(user_id).await
    }

    /// Look up the session behind a raw cookie value. Sessions whose user
    /// has disappeared are deleted; a changed identity is written back.
    pub async fn resolve(&self, raw: &str) -> Result<Option<SessionContext>, DatabaseError> {
        let id_hash = sha256_hex(raw);
        let Some(session) = self.sessions.find_active(&id_hash).await? else {
            return Ok(None);
        };

        let Some(user) = self.users.find_by_id(session.user_id).await? else {
            tracing::info!("Dropping session for deleted user {}", session.user_id);
            self.sessions.delete(&id_hash).await?;
            return Ok(None);
        };

        if identity_changed(&session, &user) {
            self.sessions.refresh_identity(&id_hash, &user).await?;
        }
        Ok(Some(SessionContext::new(id_hash, &user)))
    }

    pub fn cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(cookie::time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }
}

/// Raw session id from the request's `Cookie` headers, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn store(secure: bool) -> SessionStore {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bomatrack_test")
            .unwrap();
        SessionStore::new(Database::from_pool(pool), 12, secure)
    }

    #[tokio::test]
    async fn session_cookie_attributes() {
        let cookie = store(true).cookie("abc".into()).to_string();
        assert!(cookie.starts_with("bomatrack_session=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=43200"));
    }

    #[tokio::test]
    async fn removal_cookie_expires_immediately() {
        let cookie = store(false).removal_cookie().to_string();
        assert!(cookie.starts_with("bomatrack_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn reads_session_id_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; bomatrack_session=deadbeef; lang=sw"),
        );
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("deadbeef"));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("bomatrack_session="));
        assert_eq!(session_id_from_headers(&headers), None);
    }
}
