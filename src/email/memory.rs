use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{MailError, Mailer, OutgoingEmail};

/// Keeps messages in memory instead of sending them.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<RwLock<Vec<OutgoingEmail>>>,
    fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails, for exercising delivery-error paths.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.read().await.clone()
    }

    pub async fn last_to(&self, to_email: &str) -> Option<OutgoingEmail> {
        self.sent
            .read()
            .await
            .iter()
            .rev()
            .find(|e| e.to_email == to_email)
            .cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("memory mailer configured to fail".to_string()));
        }
        self.sent.write().await.push(email.clone());
        Ok(())
    }
}
