use chrono::{Duration, Utc};
use sqlx::PgExecutor;

use crate::auth::token::{generate_token, sha256_hex};
use crate::database::manager::{Database, DatabaseError};
use crate::database::models::PasswordResetToken;

/// A freshly issued reset link: the raw token for the email and the stored row.
#[derive(Debug, Clone)]
pub struct IssuedReset {
    pub token: String,
    pub record: PasswordResetToken,
}

#[derive(Clone)]
pub struct PasswordResetTokenRepository {
    db: Database,
}

impl PasswordResetTokenRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Spend any outstanding links for the user and issue a new one.
    pub async fn generate_for_user(&self, user_id: i64, ttl: Duration) -> Result<IssuedReset, DatabaseError> {
        let token = generate_token();
        let token_hash = sha256_hex(&token);
        let record = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    revoke_all_for_user(&mut *conn, user_id).await?;
                    let record = insert(&mut *conn, user_id, &token_hash, ttl).await?;
                    Ok::<_, DatabaseError>(record)
                })
            })
            .await?;
        Ok(IssuedReset { token, record })
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, DatabaseError> {
        let row = sqlx::query_as::<_, PasswordResetToken>("SELECT * FROM password_reset_tokens WHERE token_hash = $1")
            .bind(sha256_hex(token))
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row)
    }

    pub async fn cleanup_expired(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < NOW()")
            .execute(self.db.pool())
            .await?;
        tracing::info!("Removed {} expired password reset tokens", result.rows_affected());
        Ok(result.rows_affected())
    }
}

pub async fn insert<'e, E>(
    executor: E,
    user_id: i64,
    token_hash: &str,
    ttl: Duration,
) -> Result<PasswordResetToken, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PasswordResetToken>(
        r#"
        INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(Utc::now() + ttl)
    .fetch_one(executor)
    .await?;
    Ok(row)
}

/// Row-lock the token behind `token` for the rest of the transaction.
pub async fn lock_by_token<'e, E>(executor: E, token: &str) -> Result<Option<PasswordResetToken>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PasswordResetToken>(
        "SELECT * FROM password_reset_tokens WHERE token_hash = $1 FOR UPDATE",
    )
    .bind(sha256_hex(token))
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn mark_used<'e, E>(executor: E, id: i64) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn revoke_all_for_user<'e, E>(executor: E, user_id: i64) -> Result<u64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result =
        sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE user_id = $1 AND used_at IS NULL")
            .bind(user_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}
