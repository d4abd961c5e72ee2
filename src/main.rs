use anyhow::{bail, Context};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use exam_api::database::DatabaseManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("exam_api=info,tower_http=info")),
        )
        .init();

    let config = exam_api::config::config();
    info!("Starting Exam API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }
    if exam_api::is_production!() && config.api.reveal_correctness {
        warn!("API_REVEAL_CORRECTNESS is enabled in production; answer correctness is visible to exam takers");
    }

    if config.database.run_migrations && config.database.url.is_some() {
        // The server still starts; /health reports the database state
        if let Err(e) = DatabaseManager::migrate().await {
            warn!("Migrations not applied at startup: {}", e);
        }
    }

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Exam API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        exam_api::app().into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
