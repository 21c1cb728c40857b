mod api;
mod catalog;
mod config;
mod errors;
mod models;
mod store;

use api::ApiServer;
use config::{Config, StoreBackend};
use std::sync::Arc;
use store::{CarStore, MemoryCarStore, MongoCarStore, OfflineCarStore};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_store(config: &Config) -> Arc<dyn CarStore> {
    match config.backend {
        StoreBackend::Memory => Arc::new(MemoryCarStore::new()),
        StoreBackend::Mongo => match MongoCarStore::connect(&config.db).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("[mongodb] Failed to create client: {}", e);
                Arc::new(OfflineCarStore::new(e.to_string()))
            }
        },
    }
}

/// Index creation and the liveness ping. Failures are logged only; the API
/// still starts and store-backed routes report errors per request.
async fn prepare_store(store: &dyn CarStore) {
    if let Err(e) = store.ensure_name_index().await {
        tracing::error!("[{}] Failed to create name index: {}", store.name(), e);
    }

    match store.ping().await {
        Ok(()) => tracing::info!("[{}] Connected!", store.name()),
        Err(e) => tracing::error!("[{}] Ping failed: {}", store.name(), e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!(
        "Toy cars starting: backend {:?}, update mode {:?}, port {}",
        config.backend,
        config.update_mode,
        config.api_port
    );

    let store = open_store(&config).await;
    prepare_store(store.as_ref()).await;

    ApiServer::new(store, &config).run(config).await
}
