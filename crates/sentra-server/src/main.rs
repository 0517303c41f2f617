//! Sentra HTTP Server
//!
//! Provides the REST API for transaction ingestion, review, and user risk
//! profiles.

use anyhow::Result;
use sentra_server::{api, config::ServerConfig, engine};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = ServerConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let service = engine::init_service(&config).await?;
    info!("Lifecycle service initialized");

    let app = api::create_router(service);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Transactions API: http://{}/v1/transactions", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sentra_server=info,sentra_runtime=info,sentra_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
