use std::net::SocketAddr;

use anyhow::Context;
use flipgate_backend::{build_app, config::GateConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flipgate_backend=debug,flipgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = GateConfig::from_env().context("Invalid configuration")?;
    config.warn_insecure();

    tracing::info!(
        "Starting flipgate with {} allowlisted email(s) and {} local account(s)",
        config.allowlist.len(),
        config.local_users.len()
    );

    let port = config.port;
    let state = AppState::new(config).context("Failed to build HTTP client")?;
    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
