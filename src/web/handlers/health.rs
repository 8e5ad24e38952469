//! Service status handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::{HealthResponse, RootResponse, UploadDirectoryStatus};
use crate::web::handlers::AppState;

/// GET / - Describe the service.
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    tracing::debug!("Root endpoint accessed");

    Json(RootResponse {
        message: "Filebox file storage API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upload_dir: state.storage_root.display().to_string(),
        upload_dir_exists: state.storage_root.exists(),
        cors_origins: state.cors_origins.clone(),
    })
}

/// GET /health - Report database and storage status.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_healthy = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            false
        }
    };

    let root = &state.storage_root;
    let response = HealthResponse {
        status: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
        database: if db_healthy { "connected" } else { "disconnected" }.to_string(),
        upload_directory: UploadDirectoryStatus {
            path: root.display().to_string(),
            exists: root.exists(),
            is_dir: root.is_dir(),
        },
        cors_origins: state.cors_origins.clone(),
    };

    tracing::debug!(
        status = %response.status,
        upload_dir_exists = response.upload_directory.exists,
        "Health check completed"
    );

    Json(response)
}
