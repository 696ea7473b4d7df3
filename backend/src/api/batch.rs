//! Batch generation API handler
//!
//! Fans one prompt out over the selected templates and streams per-variant
//! progress as Server-Sent Events: a `pending` event for every variant,
//! then `settled` events in completion order, then `[DONE]`.

use crate::api::streaming::create_sse_response;
use crate::api::utils::{resolve_templates, validate_optional_text, validate_text};
use crate::error::AppError;
use crate::orchestrator::fan_out::fan_out;
use crate::orchestrator::prompt;
use crate::orchestrator::tasks::{self, GenerationKind, GenerationRequest};
use crate::state::SharedState;
use axum::{extract::State, response::Json, response::Response};
use serde::Deserialize;

/// Media produced by a batch
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    /// One image per variant
    Image,
    /// One video per variant
    Video,
}

impl From<BatchKind> for GenerationKind {
    fn from(kind: BatchKind) -> Self {
        match kind {
            BatchKind::Image => GenerationKind::Image,
            BatchKind::Video => GenerationKind::Video,
        }
    }
}

/// Batch generation request
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Base prompt shared by every variant
    pub prompt: String,
    /// Main copy text shown on the POP
    #[serde(default)]
    pub main_text: String,
    /// Secondary copy text
    #[serde(default)]
    pub sub_text: String,
    /// Selected template names; empty means one unlabeled variant
    #[serde(default)]
    pub templates: Vec<String>,
    /// Media to generate
    pub kind: BatchKind,
}

/// Compose one generation request per selected template
pub fn build_requests(
    state: &SharedState,
    request: &BatchRequest,
) -> Result<Vec<GenerationRequest>, AppError> {
    let limits = &state.config.limits;
    validate_text("prompt", &request.prompt, limits.max_prompt_length)?;
    validate_optional_text("main_text", &request.main_text, limits.max_prompt_length)?;
    validate_optional_text("sub_text", &request.sub_text, limits.max_prompt_length)?;

    let templates = resolve_templates(&state.templates, &request.templates, limits.max_variants)?;
    let kind = GenerationKind::from(request.kind);

    if templates.is_empty() {
        let composed = prompt::compose(&request.prompt, &request.main_text, &request.sub_text, None);
        return Ok(vec![GenerationRequest::new(composed, None, kind)]);
    }

    Ok(templates
        .iter()
        .map(|template| {
            let composed = prompt::compose(
                &request.prompt,
                &request.main_text,
                &request.sub_text,
                Some(template),
            );
            GenerationRequest::new(composed, Some(template.name.clone()), kind)
        })
        .collect())
}

/// POST /api/generateBatch - Generate every selected variant concurrently
pub async fn generate_batch(
    State(state): State<SharedState>,
    Json(request): Json<BatchRequest>,
) -> Result<Response, AppError> {
    let requests = build_requests(&state, &request)?;
    tracing::info!(
        variants = requests.len(),
        kind = ?request.kind,
        "Starting batch generation"
    );

    let task_state = state.clone();
    let events = fan_out(requests, move |generation| {
        let state = task_state.clone();
        async move { tasks::run(&state.task_context(), generation).await }
    });

    create_sse_response(events)
}
