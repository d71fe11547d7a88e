//! HTTP route handlers for the upload service

use crate::{handlers::uploads, AppState};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/upload-categories", get(uploads::list_categories))
        .route("/api/uploads/:category", post(uploads::upload_file))
        .route(
            "/api/uploads/:category/:filename",
            get(uploads::serve_file).delete(uploads::delete_file),
        )
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "app": state.app_name,
        "version": state.version,
        "endpoints": {
            "health": "/health",
            "categories": "/api/upload-categories",
            "upload": "/api/uploads/{category}",
            "file": "/api/uploads/{category}/{filename}"
        }
    }))
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp()
    }))
}
