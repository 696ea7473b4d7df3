//! API module
//!
//! Contains HTTP request handlers for the generation endpoints and the
//! router that wires them to their paths.

pub mod batch;
pub mod generation;
pub mod handlers;
pub mod streaming;
pub mod utils;

use crate::services::artifacts::ARTIFACT_URL_PREFIX;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

/// Build the application router
///
/// Artifacts are served from the artifact directory under `/artifacts`;
/// when a static directory is configured it answers every unmatched path.
pub fn router(state: SharedState) -> Router {
    let mut app = Router::new()
        .route("/template.json", get(handlers::get_templates))
        .route("/api/health", get(handlers::health_check))
        .route("/api/generateInputs", post(generation::generate_inputs))
        .route("/api/generateImage", post(generation::generate_image))
        .route("/api/editImage", post(generation::edit_image))
        .route("/api/generateVideo", post(generation::generate_video))
        .route("/api/generateBatch", post(batch::generate_batch))
        .route("/api/clearTemp", post(handlers::clear_temp))
        .nest_service(ARTIFACT_URL_PREFIX, ServeDir::new(state.store.root()));

    if let Some(static_dir) = &state.config.storage.static_dir {
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.with_state(state)
}
