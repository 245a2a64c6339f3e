use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bomatrack::config::config;
use bomatrack::database::Database;
use bomatrack::state::AppState;
use bomatrack::{is_development, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up DATABASE_URL, SMTP_*, etc.
    let _ = dotenvy::dotenv();

    let default_filter = if is_development!() {
        "bomatrack=debug,tower_http=debug"
    } else {
        "bomatrack=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let config = config();
    tracing::info!("Starting {} in {:?} mode", config.app.name, config.environment);

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    if config.database.run_migrations {
        db.migrate().await.context("failed to apply migrations")?;
    }

    let state = AppState::from_config(db.clone(), config.clone()).context("failed to build application state")?;

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("BomaTrack listening on http://{}", bind_addr);

    let served = server::serve(listener, state).await;
    db.close().await;
    served.context("server error")
}
