//! wxhook Server - Main Entry Point

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use wxhook_server::{
    api,
    config::{self, StoreBackend},
    store::{DocumentStore, LeanCloudStore, MemoryStore},
    wechat::WeixinClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wxhook_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting wxhook server"
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!("wxhook/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    // Initialize document store
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::LeanCloud => {
            let store = LeanCloudStore::from_config(http.clone(), &config)
                .context("LeanCloud storage is not configured")?;
            info!(server = ?config.leancloud_api_server, "Using LeanCloud storage");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory storage; records are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Initialize platform client
    if !config.has_weixin_credentials() {
        tracing::warn!("WEIXIN_APP_ID/WEIXIN_APP_SECRET not set. Access tokens and uploads disabled.");
    }
    let platform = Arc::new(WeixinClient::from_config(http, &config));

    // Build application state
    let state = api::AppState::new(config.clone(), store, platform);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
