pub mod handlers;
pub mod models;
pub mod router;

use crate::config::{Config, UpdateMode};
use crate::store::CarStore;
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared handler state: the store connection plus update policy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CarStore>,
    pub update_mode: UpdateMode,
}

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(store: Arc<dyn CarStore>, config: &Config) -> Self {
        Self {
            state: AppState {
                store,
                update_mode: config.update_mode,
            },
        }
    }

    /// Binds the server to the configured port and serves until Ctrl+C or
    /// SIGTERM, then closes the store connection.
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        let store = Arc::clone(&self.state.store);
        let app = router::build(self.state);
        let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Toy car running on port: {}", config.api_port);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Shutting down...");
        store.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
