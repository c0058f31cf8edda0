use std::sync::Arc;

use anyhow::Context;
use booking_service::config::load_service_config;
use booking_service::credential_store::PgCredentialStore;
use booking_service::repository::{PgBookingRepository, MIGRATOR};
use booking_service::{build_router, AppState, AuthSettings};
use common_auth::{EnvSecretKeyStore, SigningKeys};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    if config.run_migrations {
        MIGRATOR
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("database migrations applied");
    }

    let keys = SigningKeys::load(&EnvSecretKeyStore::new(), config.environment)
        .await
        .context("Failed to load signing keys")?;

    let state = AppState::new(
        Arc::new(keys),
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgBookingRepository::new(pool)),
        &AuthSettings::from(&config),
    )?;
    let app = build_router(state);

    let addr = config.bind_addr();
    info!(%addr, environment = %config.environment, "starting booking-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
