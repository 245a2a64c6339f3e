//! Outbound mail. [`Mailer`] is the transport seam; [`EmailService`] renders
//! the account emails and hands them to whichever transport is configured.

pub mod console;
pub mod memory;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::views::{ViewError, Views};

pub use console::LogMailer;
pub use memory::MemoryMailer;
pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    Address(String),

    #[error("could not build message: {0}")]
    Build(String),

    #[error("smtp transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Render(#[from] ViewError),
}

/// A fully rendered message ready for a transport.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    views: Views,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, views: Views) -> Self {
        Self { mailer, views }
    }

    pub async fn send_verification_email(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
        base_url: &str,
    ) -> Result<(), MailError> {
        let link = templates::verification_link(base_url, token);
        let content = templates::verification(&self.views, to_name, &link)?;
        self.deliver(to_email, to_name, content).await
    }

    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
        base_url: &str,
    ) -> Result<(), MailError> {
        let link = templates::password_reset_link(base_url, token);
        let content = templates::password_reset(&self.views, to_name, &link)?;
        self.deliver(to_email, to_name, content).await
    }

    async fn deliver(&self, to_email: &str, to_name: &str, content: templates::EmailContent) -> Result<(), MailError> {
        let email = OutgoingEmail {
            to_email: to_email.to_string(),
            to_name: to_name.to_string(),
            subject: content.subject,
            html_body: content.html,
            text_body: content.text,
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                tracing::info!("Sent \"{}\" to {}", email.subject, email.to_email);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to send \"{}\" to {}: {}", email.subject, email.to_email, e);
                Err(e)
            }
        }
    }
}
