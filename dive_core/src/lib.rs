//! Core library for the dive-center upload service: category rules, content
//! sniffing, the upload validator, disk storage, and the HTTP surface.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod uploads;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use uploads::{
    validate, CategoryRule, Outcome, StagedUpload, StoredUpload, UploadRejection, UploadStore,
};

use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub config: AppConfig,
    pub store: UploadStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = UploadStore::new(&config.uploads.storage_dir);
        Self {
            app_name: "Dive Center Upload Service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            store,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.uploads.max_request_size_bytes();

    Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
