use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Session, User};

#[derive(Clone)]
pub struct SessionRepository {
    db: Database,
}

impl SessionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, id_hash: &str, user: &User, expires_at: DateTime<Utc>) -> Result<Session, DatabaseError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, username, email, is_email_verified, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id_hash)
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.is_email_verified)
        .bind(expires_at)
        .fetch_one(self.db.pool())
        .await?;
        Ok(session)
    }

    pub async fn find_active(&self, id_hash: &str) -> Result<Option<Session>, DatabaseError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1 AND expires_at > NOW()")
            .bind(id_hash)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(session)
    }

    /// Bring the stored identity in line with the current user row.
    pub async fn refresh_identity(&self, id_hash: &str, user: &User) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE sessions SET username = $2, email = $3, is_email_verified = $4 WHERE id = $1",
        )
        .bind(id_hash)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.is_email_verified)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id_hash)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_user(&self, user_id: i64) -> Result<u64, DatabaseError> {
        delete_for_user(self.db.pool(), user_id).await
    }

    pub async fn purge_expired(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

/// Sign the user out everywhere.
pub async fn delete_for_user<'e, E>(executor: E, user_id: i64) -> Result<u64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
