//! Generation API handlers
//!
//! One endpoint per upstream capability. Each handler runs a single
//! generation task and answers with the artifact URL, or with an error
//! response when the task fails. No partial body is ever written.

use crate::api::utils::{validate_text, variant_label};
use crate::error::AppError;
use crate::orchestrator::backends::GeneratedInputs;
use crate::orchestrator::tasks;
use crate::state::SharedState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

// Request types
/// Inputs generation request
#[derive(Debug, Deserialize)]
pub struct GenerateInputsRequest {
    /// Free-text campaign objective
    pub objectives: String,
}

/// Image or video generation request
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Final prompt sent upstream
    pub prompt: String,
    /// Template label used in the artifact name
    #[serde(default)]
    pub template: Option<String>,
}

/// Image edit request
#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    /// Edit instruction
    pub prompt: String,
    /// URL or name of the artifact to edit
    #[serde(rename = "filePath")]
    pub file_path: String,
}

// Response types
/// Location of a new artifact
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    /// Artifact URL
    pub url: String,
}

/// POST /api/generateInputs - Copy text and prompts from an objective
pub async fn generate_inputs(
    State(state): State<SharedState>,
    Json(request): Json<GenerateInputsRequest>,
) -> Result<Json<GeneratedInputs>, AppError> {
    validate_text(
        "objectives",
        &request.objectives,
        state.config.limits.max_prompt_length,
    )?;

    let inputs = tasks::generate_inputs(state.backend.as_ref(), &request.objectives).await?;
    Ok(Json(inputs))
}

/// POST /api/generateImage - Generate one image
pub async fn generate_image(
    State(state): State<SharedState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    validate_text("prompt", &request.prompt, state.config.limits.max_prompt_length)?;
    let variant = variant_label(request.template.as_deref());

    let artifact = tasks::generate_image(
        state.backend.as_ref(),
        &state.store,
        &request.prompt,
        variant.as_deref(),
    )
    .await?;

    Ok(Json(UrlResponse { url: artifact.url }))
}

/// POST /api/editImage - Edit an image previously generated by this server
pub async fn edit_image(
    State(state): State<SharedState>,
    Json(request): Json<EditImageRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    validate_text("prompt", &request.prompt, state.config.limits.max_prompt_length)?;
    if request.file_path.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "filePath cannot be empty".to_string(),
        ));
    }

    let artifact = tasks::edit_image(
        state.backend.as_ref(),
        &state.store,
        &request.prompt,
        request.file_path.trim(),
    )
    .await?;

    Ok(Json(UrlResponse { url: artifact.url }))
}

/// POST /api/generateVideo - Generate one video, waiting for the job to finish
pub async fn generate_video(
    State(state): State<SharedState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    validate_text("prompt", &request.prompt, state.config.limits.max_prompt_length)?;
    let variant = variant_label(request.template.as_deref());

    let artifact = tasks::generate_video(
        state.backend.as_ref(),
        &state.store,
        &state.poller,
        &request.prompt,
        variant.as_deref(),
    )
    .await?;

    Ok(Json(UrlResponse { url: artifact.url }))
}
