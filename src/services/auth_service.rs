use chrono::{Duration, Utc};
use thiserror::Error;

use crate::auth::password::{hash_password_blocking, verify_password_blocking, PasswordError};
use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{User, VerificationToken};
use crate::database::repositories::{
    password_reset_token, session, user, verification_token, NewUser, PasswordResetTokenRepository, ProfileUpdate,
    UserRepository, VerificationTokenRepository,
};
use crate::email::EmailService;
use crate::error::{AppError, FieldErrors};
use crate::validation::{self, Validator};

pub const MSG_LOGIN_UNVERIFIED: &str =
    "Please verify your email address before logging in. Check your inbox for the verification email.";
pub const MSG_LOGIN_INVALID: &str = "Invalid username/email or password";
pub const MSG_EMAIL_TAKEN: &str = "An account with this email already exists";
pub const MSG_USERNAME_TAKEN: &str = "This username is already taken";
pub const MSG_RESET_LINK_INVALID: &str = "This password reset link is invalid or has expired.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => AppError::Validation(errors),
            AuthError::Database(e) => AppError::Persistence(e),
            AuthError::Password(e) => AppError::Password(e),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// What happened to the verification email after the account was created.
/// The account persists in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDelivery {
    Sent,
    EmailFailed,
    TokenFailed,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub delivery: TokenDelivery,
}

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated(User),
    /// Credentials matched but the email is unverified; no session may be
    /// established.
    Unverified,
    InvalidCredentials,
}

#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    Verified(User),
    AlreadyVerified(User),
    TokenNotFound,
    /// Token exists but is spent or expired.
    TokenInvalid,
    UserNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    DeliveryFailed,
    TokenFailed,
    UnknownEmail,
    AlreadyVerified,
}

/// Result of asking for a reset link. Callers show the same notice for
/// `Sent` and `UnknownEmail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    Sent,
    UnknownEmail,
    DeliveryFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordResetOutcome {
    /// Password replaced; every session of the user was ended.
    Reset { user_id: i64 },
    /// Unknown, spent or expired link.
    TokenInvalid,
}

/// Registration, login, email verification and account maintenance.
pub struct AuthService {
    db: Database,
    users: UserRepository,
    tokens: VerificationTokenRepository,
    reset_tokens: PasswordResetTokenRepository,
    email: EmailService,
    base_url: String,
    token_ttl: Duration,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(db: Database, email: EmailService, base_url: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            tokens: VerificationTokenRepository::new(db.clone()),
            reset_tokens: PasswordResetTokenRepository::new(db.clone()),
            db,
            email,
            base_url: base_url.into(),
            token_ttl,
            reset_ttl: Duration::minutes(60),
        }
    }

    pub fn with_reset_ttl(mut self, reset_ttl: Duration) -> Self {
        self.reset_ttl = reset_ttl;
        self
    }

    pub async fn register(&self, input: RegistrationInput) -> Result<Registration, AuthError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();

        let mut v = Validator::new();
        if let Some(msg) = validation::validate_username(&username) {
            v.add("username", msg);
        }
        if email.is_empty() {
            v.add("email", "Email is required");
        } else if !validation::is_valid_email(&email) {
            v.add("email", "Please enter a valid email address");
        }
        if let Some(msg) = validation::validate_password_strength(&input.password) {
            v.add("password", msg);
        }
        if input.confirm_password.is_empty() {
            v.add("confirm_password", "Please confirm your password");
        } else if input.password != input.confirm_password {
            v.add("confirm_password", "Passwords do not match");
        }

        if !v.has("email") && self.users.find_by_email(&email).await?.is_some() {
            v.add("email", MSG_EMAIL_TAKEN);
        }
        if !v.has("username") && self.users.username_taken(&username, None).await? {
            v.add("username", MSG_USERNAME_TAKEN);
        }
        v.finish().map_err(AuthError::Validation)?;

        let password_hash = hash_password_blocking(input.password).await?;
        let new_user = NewUser {
            username,
            email,
            password_hash,
            first_name: validation::optional(&input.first_name),
            last_name: validation::optional(&input.last_name),
        };

        let user = match self.users.create(&new_user).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration.
            Err(DatabaseError::UniqueViolation(constraint)) => {
                let mut errors = FieldErrors::new();
                if constraint.contains("email") {
                    errors.insert("email".into(), MSG_EMAIL_TAKEN.into());
                } else {
                    errors.insert("username".into(), MSG_USERNAME_TAKEN.into());
                }
                return Err(AuthError::Validation(errors));
            }
            Err(e) => return Err(e.into()),
        };

        let delivery = match self.issue_token(&user).await {
            Ok(token) => match self.send_verification(&user, &token).await {
                true => TokenDelivery::Sent,
                false => TokenDelivery::EmailFailed,
            },
            Err(e) => {
                tracing::error!("Could not issue verification token for user {}: {}", user.id, e);
                TokenDelivery::TokenFailed
            }
        };

        Ok(Registration { user, delivery })
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let identifier = identifier.trim();

        let mut v = Validator::new();
        v.required("username", identifier, "Username or email is required");
        v.check("password", !password.is_empty(), "Password is required");
        v.finish().map_err(AuthError::Validation)?;

        let Some(user) = self.users.find_by_username_or_email(identifier).await? else {
            tracing::debug!("Login failed: no account for {}", identifier);
            return Ok(LoginOutcome::InvalidCredentials);
        };

        if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!("Login failed: bad password for user {}", user.id);
            return Ok(LoginOutcome::InvalidCredentials);
        }

        if !user.is_email_verified {
            tracing::info!("Login refused for unverified user {}", user.id);
            return Ok(LoginOutcome::Unverified);
        }

        self.users.update_last_login(user.id).await?;
        Ok(LoginOutcome::Authenticated(user))
    }

    /// Consume a verification token. Marking the token used and flipping the
    /// user's flag happen in one transaction.
    pub async fn verify_email(&self, token: &str) -> Result<VerificationOutcome, AuthError> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Ok(VerificationOutcome::TokenNotFound);
        }

        let outcome = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    let Some(record) = verification_token::find_by_token(&mut *conn, &token).await? else {
                        return Ok(VerificationOutcome::TokenNotFound);
                    };
                    if !record.is_valid() {
                        return Ok(VerificationOutcome::TokenInvalid);
                    }

                    let Some(user) = user::find_by_id(&mut *conn, record.user_id).await? else {
                        return Ok(VerificationOutcome::UserNotFound);
                    };
                    if user.is_email_verified {
                        return Ok(VerificationOutcome::AlreadyVerified(user));
                    }

                    if !verification_token::mark_used(&mut *conn, record.id).await? {
                        return Ok(VerificationOutcome::TokenInvalid);
                    }
                    user::mark_email_verified(&mut *conn, user.id).await?;

                    let refreshed = user::find_by_id(&mut *conn, user.id).await?;
                    Ok::<_, DatabaseError>(match refreshed {
                        Some(user) => VerificationOutcome::Verified(user),
                        None => VerificationOutcome::UserNotFound,
                    })
                })
            })
            .await?;

        if let VerificationOutcome::Verified(user) = &outcome {
            tracing::info!("Verified email for user {}", user.id);
            self.users.update_last_login(user.id).await?;
        }
        Ok(outcome)
    }

    pub async fn resend_verification(&self, email: &str) -> Result<ResendOutcome, AuthError> {
        let email = email.trim();

        let mut v = Validator::new();
        v.required("email", email, "Email address is required.");
        if !v.has("email") {
            v.check("email", validation::is_valid_email(email), "Please enter a valid email address.");
        }
        v.finish().map_err(AuthError::Validation)?;

        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(ResendOutcome::UnknownEmail);
        };
        if user.is_email_verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        let token = match self.issue_token(&user).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Could not issue verification token for user {}: {}", user.id, e);
                return Ok(ResendOutcome::TokenFailed);
            }
        };

        Ok(match self.send_verification(&user, &token).await {
            true => ResendOutcome::Sent,
            false => ResendOutcome::DeliveryFailed,
        })
    }

    /// Revoke outstanding tokens and issue a fresh one, atomically.
    pub async fn issue_token(&self, user: &User) -> Result<VerificationToken, DatabaseError> {
        self.tokens.generate_for_user(user.id, &user.email, self.token_ttl).await
    }

    async fn send_verification(&self, user: &User, token: &VerificationToken) -> bool {
        self.email
            .send_verification_email(&user.email, &user.display_name(), &token.token, &self.base_url)
            .await
            .is_ok()
    }

    pub async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<bool, AuthError> {
        let update = ProfileUpdate {
            username: update.username.trim().to_string(),
            first_name: validation::optional(&update.first_name),
            last_name: validation::optional(&update.last_name),
            phone: validation::optional(&update.phone),
        };

        let mut v = Validator::new();
        if let Some(msg) = validation::validate_username(&update.username) {
            v.add("username", msg);
        } else if self.users.username_taken(&update.username, Some(user_id)).await? {
            v.add("username", MSG_USERNAME_TAKEN);
        }
        v.finish().map_err(AuthError::Validation)?;

        Ok(self.users.update_profile(user_id, &update).await?)
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<bool, AuthError> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(false);
        };

        let mut v = Validator::new();
        if current.is_empty() {
            v.add("current_password", "Current password is required");
        } else if !verify_password_blocking(current.to_string(), user.password_hash.clone()).await? {
            v.add("current_password", "Current password is incorrect");
        }
        if let Some(msg) = validation::validate_password_strength(new_password) {
            v.add("new_password", msg);
        }
        v.check("confirm_password", new_password == confirm, "Passwords do not match");
        v.finish().map_err(AuthError::Validation)?;

        let hash = hash_password_blocking(new_password.to_string()).await?;
        Ok(self.users.change_password(user_id, &hash).await?)
    }

    /// Email a single-use reset link. Earlier links for the account stop
    /// working.
    pub async fn request_password_reset(&self, email: &str) -> Result<ResetRequestOutcome, AuthError> {
        let email = email.trim();

        let mut v = Validator::new();
        v.required("email", email, "Email address is required.");
        if !v.has("email") {
            v.check("email", validation::is_valid_email(email), "Please enter a valid email address.");
        }
        v.finish().map_err(AuthError::Validation)?;

        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(ResetRequestOutcome::UnknownEmail);
        };

        let issued = self.reset_tokens.generate_for_user(user.id, self.reset_ttl).await?;
        let sent = self
            .email
            .send_password_reset_email(&user.email, &user.display_name(), &issued.token, &self.base_url)
            .await;
        Ok(match sent {
            Ok(()) => {
                tracing::info!("Password reset link sent to user {}", user.id);
                ResetRequestOutcome::Sent
            }
            Err(e) => {
                tracing::error!("Password reset email for user {} failed: {}", user.id, e);
                ResetRequestOutcome::DeliveryFailed
            }
        })
    }

    /// Whether `token` still opens the reset form.
    pub async fn reset_token_is_valid(&self, token: &str) -> Result<bool, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(false);
        }
        let record = self.reset_tokens.find_by_token(token).await?;
        Ok(record.is_some_and(|r| r.is_valid_at(Utc::now())))
    }

    /// Replace the password behind a reset link. The link is spent and the
    /// user's sessions end in the same transaction.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<PasswordResetOutcome, AuthError> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Ok(PasswordResetOutcome::TokenInvalid);
        }

        let mut v = Validator::new();
        if let Some(msg) = validation::validate_password_strength(new_password) {
            v.add("new_password", msg);
        }
        v.check("confirm_password", new_password == confirm, "Passwords do not match");
        v.finish().map_err(AuthError::Validation)?;

        let hash = hash_password_blocking(new_password.to_string()).await?;
        let outcome = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    let Some(record) = password_reset_token::lock_by_token(&mut *conn, &token).await? else {
                        return Ok(PasswordResetOutcome::TokenInvalid);
                    };
                    if !record.is_valid_at(Utc::now()) {
                        return Ok(PasswordResetOutcome::TokenInvalid);
                    }
                    password_reset_token::mark_used(&mut *conn, record.id).await?;
                    if !user::change_password(&mut *conn, record.user_id, &hash).await? {
                        return Ok(PasswordResetOutcome::TokenInvalid);
                    }
                    session::delete_for_user(&mut *conn, record.user_id).await?;
                    Ok::<_, DatabaseError>(PasswordResetOutcome::Reset {
                        user_id: record.user_id,
                    })
                })
            })
            .await?;

        if let PasswordResetOutcome::Reset { user_id } = outcome {
            tracing::info!("Password reset for user {}", user_id);
        }
        Ok(outcome)
    }

    /// Password-confirmed account removal.
    pub async fn delete_account(&self, user_id: i64, password: &str) -> Result<bool, AuthError> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(false);
        };
        if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            return Err(AuthError::Validation(FieldErrors::from([(
                "delete_password".to_string(),
                "Password is incorrect".to_string(),
            )])));
        }
        let deleted = self.users.delete(user_id).await?;
        if deleted {
            tracing::info!("Deleted account {} ({})", user.username, user.id);
        }
        Ok(deleted)
    }
}
