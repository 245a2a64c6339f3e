use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use super::{MailError, Mailer, OutgoingEmail};
use crate::config::MailConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Port 465 uses implicit TLS, local relays run unencrypted, everything
    /// else negotiates STARTTLS.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let host = config.smtp_host.as_str();
        let builder = if matches!(host, "localhost" | "127.0.0.1") {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        } else if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host).map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.smtp_timeout_secs)));

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = Mailbox::new(Some(config.from_name.clone()), parse_address(&config.from_email)?);

        tracing::info!("SMTP mailer configured for {}:{}", host, config.smtp_port);
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_address(raw: &str) -> Result<Address, MailError> {
    raw.parse::<Address>()
        .map_err(|e| MailError::Address(format!("{}: {}", raw, e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let name = Some(email.to_name.clone()).filter(|n| !n.trim().is_empty());
        let to = Mailbox::new(name, parse_address(&email.to_email)?);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn builds_from_default_config() {
        let config = AppConfig::development();
        assert!(SmtpMailer::new(&config.mail).is_ok());
    }

    #[tokio::test]
    async fn rejects_bad_sender_address() {
        let mut config = AppConfig::development().mail;
        config.from_email = "not an address".into();
        assert!(matches!(SmtpMailer::new(&config), Err(MailError::Address(_))));
    }
}
