use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerificationToken {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub is_used: bool,
}

impl VerificationToken {
    /// A token is usable iff it has not been consumed and has not expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now <= self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Local state change mirroring a successful `mark_used` write.
    pub fn consume(&mut self, now: DateTime<Utc>) {
        self.is_used = true;
        self.used_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: Duration) -> VerificationToken {
        let now = Utc::now();
        VerificationToken {
            id: 1,
            user_id: 1,
            email: "alice@example.com".into(),
            token: "ab".repeat(32),
            expires_at: now + expires_in,
            created_at: now,
            used_at: None,
            is_used: false,
        }
    }

    #[test]
    fn fresh_token_is_valid() {
        assert!(token(Duration::hours(24)).is_valid());
    }

    #[test]
    fn consumed_token_is_invalid_immediately() {
        let mut t = token(Duration::hours(24));
        let now = Utc::now();
        t.consume(now);
        assert!(!t.is_valid_at(now));
        assert_eq!(t.used_at, Some(now));
    }

    #[test]
    fn expired_token_is_invalid_even_if_unused() {
        let t = token(Duration::hours(24));
        let later = t.expires_at + Duration::seconds(1);
        assert!(!t.is_used);
        assert!(!t.is_valid_at(later));
        assert!(t.is_expired_at(later));
    }

    #[test]
    fn token_is_valid_at_exact_expiry() {
        let t = token(Duration::hours(1));
        assert!(t.is_valid_at(t.expires_at));
    }
}
