use sqlx::PgExecutor;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::user::{is_profile_complete, User};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new unverified user. Duplicate usernames or emails surface as
    /// [`DatabaseError::UniqueViolation`].
    pub async fn create(&self, new: &NewUser) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .fetch_one(self.db.pool())
        .await?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        find_by_id(self.db.pool(), id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    /// Login lookup: the identifier may be either the username or the email.
    pub async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 OR LOWER(email) = LOWER($1) ORDER BY id LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(user)
    }

    /// True when another account already uses `username`.
    pub async fn username_taken(&self, username: &str, except_id: Option<i64>) -> Result<bool, DatabaseError> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(except_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(taken)
    }

    pub async fn mark_email_verified(&self, id: i64) -> Result<bool, DatabaseError> {
        mark_email_verified(self.db.pool(), id).await
    }

    pub async fn update_last_login(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<bool, DatabaseError> {
        let completed = is_profile_complete(
            update.first_name.as_deref(),
            update.last_name.as_deref(),
            update.phone.as_deref(),
        );

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, first_name = $3, last_name = $4, phone = $5,
                profile_completed = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.username)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(completed)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn change_password(&self, id: i64, password_hash: &str) -> Result<bool, DatabaseError> {
        change_password(self.db.pool(), id, password_hash).await
    }

    /// Account deletion. Tokens and sessions go first, then the user row; owned
    /// properties and tenants follow through the schema's cascades.
    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    let result = sqlx::query("DELETE FROM users WHERE id = $1")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    Ok::<_, DatabaseError>(result.rows_affected() > 0)
                })
            })
            .await
    }
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<User>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(user)
}

/// Idempotent: the first verification time is kept on repeat calls.
pub async fn mark_email_verified<'e, E>(executor: E, id: i64) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_email_verified = TRUE,
            email_verified_at = COALESCE(email_verified_at, NOW()),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn change_password<'e, E>(executor: E, id: i64, password_hash: &str) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
