//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_file, download_file, get_file_info, health, root, upload_file, AppState,
};
use super::middleware::create_cors_layer;

/// Room for multipart boundaries and text fields on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the main router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state
        .max_upload_size()
        .saturating_add(MULTIPART_OVERHEAD)
        .try_into()
        .unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .route("/upload", post(upload_file))
        .route("/file-info/:public_id", get(get_file_info))
        .route("/file/:public_id", delete(delete_file));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/download/:public_id", get(download_file))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&app_state.cors_origins)),
        )
        .with_state(app_state)
}
