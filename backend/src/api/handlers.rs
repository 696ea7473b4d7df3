//! Service-level API handlers
//!
//! Health check, template catalog and temp artifact cleanup.

use crate::error::AppError;
use crate::services::templates::TemplateVariant;
use crate::state::SharedState;
use axum::{extract::State, response::Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while serving
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Temp cleanup response
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    /// Set once the directory is empty
    pub cleared: bool,
    /// Number of files deleted
    pub removed: usize,
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /template.json - Serve the template catalog
pub async fn get_templates(State(state): State<SharedState>) -> Json<Vec<TemplateVariant>> {
    Json(state.templates.variants().to_vec())
}

/// POST /api/clearTemp - Delete every artifact in the shared directory
///
/// Waits for in-flight generation tasks to finish first.
pub async fn clear_temp(State(state): State<SharedState>) -> Result<Json<ClearResponse>, AppError> {
    let removed = state.store.clear().await?;
    tracing::info!(removed = removed, "Temp artifacts cleared");

    Ok(Json(ClearResponse {
        cleared: true,
        removed,
    }))
}
