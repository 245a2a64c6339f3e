//! `bomatrack-admin`: maintenance tasks run against the configured database.

use clap::{Parser, Subcommand};

use crate::config::config;
use crate::database::repositories::{PasswordResetTokenRepository, SessionRepository, VerificationTokenRepository};
use crate::database::{Database, DatabaseError};

#[derive(Parser)]
#[command(name = "bomatrack-admin")]
#[command(about = "BomaTrack administration - migrations and housekeeping")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Delete expired verification and password reset tokens")]
    CleanupTokens,

    #[command(about = "Check database connectivity")]
    Check,

    #[command(about = "Session maintenance")]
    Sessions {
        #[command(subcommand)]
        cmd: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    #[command(about = "Delete expired sessions")]
    Purge,
}

fn report(json: bool, action: &str, count: Option<u64>) {
    if json {
        let body = match count {
            Some(count) => serde_json::json!({ "success": true, "action": action, "count": count }),
            None => serde_json::json!({ "success": true, "action": action }),
        };
        println!("{}", body);
    } else {
        match count {
            Some(count) => println!("{}: {}", action, count),
            None => println!("{}: ok", action),
        }
    }
}

/// Expired verification and password reset tokens.
async fn cleanup_tokens(db: &Database) -> Result<u64, DatabaseError> {
    let verification = VerificationTokenRepository::new(db.clone()).cleanup_expired().await?;
    let reset = PasswordResetTokenRepository::new(db.clone()).cleanup_expired().await?;
    Ok(verification + reset)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let db = Database::connect(&config().database).await?;

    let outcome = match cli.command {
        Commands::Migrate => db.migrate().await.map(|_| ("migrate", None)),
        Commands::CleanupTokens => cleanup_tokens(&db).await.map(|n| ("expired tokens deleted", Some(n))),
        Commands::Check => db.health_check().await.map(|_| ("database", None)),
        Commands::Sessions {
            cmd: SessionCommands::Purge,
        } => SessionRepository::new(db.clone())
            .purge_expired()
            .await
            .map(|n| ("expired sessions deleted", Some(n))),
    };

    db.close().await;
    let (action, count) = outcome?;
    report(cli.json, action, count);
    Ok(())
}
