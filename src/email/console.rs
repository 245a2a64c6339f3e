use async_trait::async_trait;

use super::{MailError, Mailer, OutgoingEmail};

/// Development transport: logs the plain-text body, which carries the link.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to_email,
            subject = %email.subject,
            "Mail not sent (log transport):\n{}",
            email.text_body
        );
        Ok(())
    }
}
