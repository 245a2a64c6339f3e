use chrono::{Duration, Utc};
use sqlx::PgExecutor;

use crate::auth::token::generate_token;
use crate::database::manager::{Database, DatabaseError};
use crate::database::models::VerificationToken;

#[derive(Clone)]
pub struct VerificationTokenRepository {
    db: Database,
}

impl VerificationTokenRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Revoke the user's outstanding tokens and issue a fresh one valid for
    /// `ttl`, in one transaction.
    pub async fn generate_for_user(
        &self,
        user_id: i64,
        email: &str,
        ttl: Duration,
    ) -> Result<VerificationToken, DatabaseError> {
        let email = email.to_string();
        let token = generate_token();
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    revoke_all_for_user(&mut *conn, user_id).await?;
                    let issued = insert(&mut *conn, user_id, &email, &token, ttl).await?;
                    Ok::<_, DatabaseError>(issued)
                })
            })
            .await
    }

    /// Look a token up regardless of its state, so callers can tell a spent
    /// or expired token apart from an unknown one.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<VerificationToken>, DatabaseError> {
        find_by_token(self.db.pool(), token).await
    }

    /// Most recent token issued to the user.
    pub async fn find_by_user(&self, user_id: i64) -> Result<Option<VerificationToken>, DatabaseError> {
        let token = sqlx::query_as::<_, VerificationToken>(
            "SELECT * FROM verification_tokens WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(token)
    }

    pub async fn mark_used(&self, id: i64) -> Result<bool, DatabaseError> {
        mark_used(self.db.pool(), id).await
    }

    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, DatabaseError> {
        revoke_all_for_user(self.db.pool(), user_id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove tokens past their expiry; returns how many were deleted.
    pub async fn cleanup_expired(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE expires_at < NOW()")
            .execute(self.db.pool())
            .await?;
        tracing::info!("Removed {} expired verification tokens", result.rows_affected());
        Ok(result.rows_affected())
    }
}

pub async fn insert<'e, E>(
    executor: E,
    user_id: i64,
    email: &str,
    token: &str,
    ttl: Duration,
) -> Result<VerificationToken, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let expires_at = Utc::now() + ttl;
    let row = sqlx::query_as::<_, VerificationToken>(
        r#"
        INSERT INTO verification_tokens (user_id, email, token, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(token)
    .bind(expires_at)
    .fetch_one(executor)
    .await?;
    Ok(row)
}

pub async fn find_by_token<'e, E>(executor: E, token: &str) -> Result<Option<VerificationToken>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, VerificationToken>("SELECT * FROM verification_tokens WHERE token = $1")
        .bind(token)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// Consume a token. Only an unused token can be marked, so a concurrent second
/// consumer sees `false`.
pub async fn mark_used<'e, E>(executor: E, id: i64) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE verification_tokens SET is_used = TRUE, used_at = NOW() WHERE id = $1 AND is_used = FALSE",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn revoke_all_for_user<'e, E>(executor: E, user_id: i64) -> Result<u64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE verification_tokens SET is_used = TRUE, used_at = NOW() WHERE user_id = $1 AND is_used = FALSE",
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
