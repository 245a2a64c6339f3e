use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub app: ApplicationConfig,
    pub mail: MailConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Taken from DATABASE_URL; empty means "not configured".
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    /// Pool acquire timeout in seconds.
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub name: String,
    /// Public origin used when building links in outbound mail.
    pub base_url: String,
    pub expiring_lease_days: i64,
    pub recent_payments_limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailTransport {
    /// Deliver through an SMTP relay.
    Smtp,
    /// Write the message summary to the log instead of sending it.
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
    pub smtp_timeout_secs: u64,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
    pub verification_token_ttl_hours: i64,
    pub password_reset_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Server overrides
        if let Ok(v) = env::var("BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(port) = env::var("BOMATRACK_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = v.parse().unwrap_or(self.server.request_timeout_secs);
        }

        // Application overrides
        if let Ok(v) = env::var("APP_BASE_URL") {
            self.app.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("DASHBOARD_EXPIRING_LEASE_DAYS") {
            self.app.expiring_lease_days = v.parse().unwrap_or(self.app.expiring_lease_days);
        }

        // Mail overrides
        if let Ok(v) = env::var("MAIL_TRANSPORT") {
            self.mail.transport = match v.to_ascii_lowercase().as_str() {
                "smtp" => MailTransport::Smtp,
                "log" | "console" => MailTransport::Log,
                _ => self.mail.transport,
            };
        }
        if let Ok(v) = env::var("SMTP_HOST") {
            self.mail.smtp_host = v;
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.mail.smtp_port = v.parse().unwrap_or(self.mail.smtp_port);
        }
        if let Ok(v) = env::var("SMTP_USERNAME") {
            self.mail.smtp_username = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SMTP_PASSWORD") {
            self.mail.smtp_password = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SMTP_TIMEOUT_SECS") {
            self.mail.smtp_timeout_secs = v.parse().unwrap_or(self.mail.smtp_timeout_secs);
        }
        if let Ok(v) = env::var("MAIL_FROM_EMAIL") {
            self.mail.from_email = v;
        }
        if let Ok(v) = env::var("MAIL_FROM_NAME") {
            self.mail.from_name = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("VERIFICATION_TOKEN_TTL_HOURS") {
            self.security.verification_token_ttl_hours =
                v.parse().unwrap_or(self.security.verification_token_ttl_hours);
        }
        if let Ok(v) = env::var("PASSWORD_RESET_TTL_MINUTES") {
            self.security.password_reset_ttl_minutes = v.parse().unwrap_or(self.security.password_reset_ttl_minutes);
        }

        self
    }

    fn defaults(environment: Environment) -> Self {
        Self {
            environment,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
                request_timeout_secs: 30,
            },
            app: ApplicationConfig {
                name: "BomaTrack".to_string(),
                base_url: "http://localhost:8080".to_string(),
                expiring_lease_days: 60,
                recent_payments_limit: 5,
            },
            mail: MailConfig {
                transport: MailTransport::Log,
                smtp_host: "localhost".to_string(),
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                smtp_timeout_secs: 10,
                from_email: "noreply@bomatrack.com".to_string(),
                from_name: "BomaTrack Property Management".to_string(),
            },
            security: SecurityConfig {
                session_ttl_hours: 24 * 7,
                secure_cookies: false,
                verification_token_ttl_hours: 24,
                password_reset_ttl_minutes: 60,
            },
        }
    }

    pub fn development() -> Self {
        Self::defaults(Environment::Development)
    }

    pub fn staging() -> Self {
        let mut config = Self::defaults(Environment::Staging);
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.server.request_timeout_secs = 20;
        config.mail.transport = MailTransport::Smtp;
        config.security.session_ttl_hours = 24;
        config.security.secure_cookies = true;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::defaults(Environment::Production);
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.run_migrations = false;
        config.server.request_timeout_secs = 15;
        config.mail.transport = MailTransport::Smtp;
        config.security.session_ttl_hours = 12;
        config.security.secure_cookies = true;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.mail.transport, MailTransport::Log);
        assert!(!config.security.secure_cookies);
        assert_eq!(config.security.verification_token_ttl_hours, 24);
        assert_eq!(config.security.password_reset_ttl_minutes, 60);
        assert_eq!(config.app.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.mail.transport, MailTransport::Smtp);
        assert!(config.security.secure_cookies);
        assert!(!config.database.run_migrations);
        assert_eq!(config.app.expiring_lease_days, 60);
    }

    #[test]
    fn test_mail_sender_defaults() {
        let config = AppConfig::staging();
        assert_eq!(config.mail.from_email, "noreply@bomatrack.com");
        assert_eq!(config.mail.from_name, "BomaTrack Property Management");
    }
}
