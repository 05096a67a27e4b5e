use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::FilesystemBlobStore;
use tracing::{Level, info};

use listing_service::config::AppConfig;
use listing_service::database::{ensure_indexes, init_db};
use listing_service::services::identity::HttpIdentityValidator;
use listing_service::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let level = config
        .server
        .log_level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = init_db(&config.database).await?;
    ensure_indexes(&db).await?;
    info!("Database ready");

    let blob_store =
        FilesystemBlobStore::new(&config.storage.path, config.storage.max_photo_size).await?;
    info!(path = %config.storage.path, "Photo store ready");

    let identity = HttpIdentityValidator::new(&config.identity)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db,
        config,
        blob_store: Arc::new(blob_store),
        identity: Arc::new(identity),
    };
    let app = listing_service::build_router(state);

    info!("Listing service running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down");
}
