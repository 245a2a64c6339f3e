use chrono::Duration;
use std::sync::Arc;

use crate::auth::SessionStore;
use crate::config::{AppConfig, MailTransport};
use crate::database::repositories::{
    PaymentRepository, PropertyRepository, TenancyRepository, TenantRepository, UnitRepository, UserRepository,
};
use crate::database::Database;
use crate::email::{EmailService, LogMailer, MailError, Mailer, SmtpMailer};
use crate::services::{AuthService, DashboardService, LeasingService, PropertyService};
use crate::views::{ViewError, Views};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Views(#[from] ViewError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Everything a handler needs, cloned into each request. Repositories and
/// services are cheap to build from the shared pool.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub views: Views,
    pub email: EmailService,
    pub sessions: SessionStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire state using the transport selected in configuration.
    pub fn from_config(db: Database, config: AppConfig) -> Result<Self, StateError> {
        let mailer: Arc<dyn Mailer> = match config.mail.transport {
            MailTransport::Smtp => Arc::new(SmtpMailer::new(&config.mail)?),
            MailTransport::Log => Arc::new(LogMailer),
        };
        Self::with_mailer(db, config, mailer)
    }

    pub fn with_mailer(db: Database, config: AppConfig, mailer: Arc<dyn Mailer>) -> Result<Self, StateError> {
        let views = Views::new()?;
        Ok(Self {
            email: EmailService::new(mailer, views.clone()),
            sessions: SessionStore::new(
                db.clone(),
                config.security.session_ttl_hours,
                config.security.secure_cookies,
            ),
            views,
            db,
            config: Arc::new(config),
        })
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(
            self.db.clone(),
            self.email.clone(),
            self.config.app.base_url.clone(),
            Duration::hours(self.config.security.verification_token_ttl_hours),
        )
        .with_reset_ttl(Duration::minutes(self.config.security.password_reset_ttl_minutes))
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.db.clone())
    }

    pub fn leasing(&self) -> LeasingService {
        LeasingService::new(self.db.clone())
    }

    pub fn property_service(&self) -> PropertyService {
        PropertyService::new(self.db.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.db.clone())
    }

    pub fn properties(&self) -> PropertyRepository {
        PropertyRepository::new(self.db.clone())
    }

    pub fn units(&self) -> UnitRepository {
        UnitRepository::new(self.db.clone())
    }

    pub fn tenants(&self) -> TenantRepository {
        TenantRepository::new(self.db.clone())
    }

    pub fn tenancies(&self) -> TenancyRepository {
        TenancyRepository::new(self.db.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.db.clone())
    }
}
