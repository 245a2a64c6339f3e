use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Stored half of a reset link. The raw token only ever exists in the email.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now <= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(now: DateTime<Utc>) -> PasswordResetToken {
        PasswordResetToken {
            id: 1,
            user_id: 1,
            token_hash: "0".repeat(64),
            expires_at: now + Duration::minutes(60),
            created_at: now,
            used_at: None,
        }
    }

    #[test]
    fn valid_until_expiry_and_first_use() {
        let now = Utc::now();
        let t = token(now);
        assert!(t.is_valid_at(now));
        assert!(t.is_valid_at(t.expires_at));
        assert!(!t.is_valid_at(t.expires_at + Duration::seconds(1)));

        let used = PasswordResetToken {
            used_at: Some(now),
            ..token(now)
        };
        assert!(!used.is_valid_at(now));
    }
}
