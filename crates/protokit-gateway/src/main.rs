//! ProtoKit Gateway — live editor at 127.0.0.1:8501 (configurable via `bind_addr`).
//! Launched apps are served separately at the well-known dev-server port (8502).

use protokit_core::{ComponentRegistry, ToolkitConfig};
use protokit_gateway::{build_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ToolkitConfig::load()?;
    let registry = ComponentRegistry::http(
        Duration::from_secs(config.http_timeout_secs),
        config.source_extension.clone(),
    )?;
    let bind_addr = config.bind_addr.clone();
    let app_endpoint = config.app_endpoint();

    let state = Arc::new(AppState::new(config, registry)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("[GATEWAY] Live editor at http://{}", bind_addr);
    tracing::info!("[GATEWAY] Launched apps are served at {}", app_endpoint);

    axum::serve(listener, app).await?;
    Ok(())
}
