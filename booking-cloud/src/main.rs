//! booking-cloud: HTTP host for the reservation engine
//!
//! Wires the engine to PostgreSQL, Stripe and the mailer, then serves:
//! - availability lookups
//! - create / view / modify / cancel through management links
//! - deposit hold placement
//! - the cron-triggered reminder sweep

mod api;
mod config;
mod db;
mod logger;
mod mailer;
mod state;
mod stripe;

use booking_engine::{ReservationService, SystemClock};
use config::Config;
use state::AppState;
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _log_guard = logger::init(config.log_dir.as_deref());

    tracing::info!("Starting booking-cloud (env: {})", config.environment);
    if config.is_development() {
        tracing::warn!("Development mode: unset secrets fall back to placeholders");
    }

    let pool = db::connect(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database connected, migrations applied");

    let service = ReservationService::new(
        Arc::new(db::PgStore::new(pool)),
        Arc::new(stripe::StripeGateway::new(config.stripe_secret_key.clone())?),
        Arc::new(mailer::LogMailer::new(config.mail_from.clone())),
        Arc::new(SystemClock),
        config.reservation_secret_key.as_bytes(),
        config.engine(),
    )?;
    let state = AppState::new(service, config.cron_secret.clone());
    let app = api::router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("booking-cloud HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("booking-cloud stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
