//! Generation tasks
//!
//! A generation task performs exactly one upstream cycle (request/response,
//! or submit/poll/fetch for video) and persists its output as a new
//! artifact. Every task holds the store's task guard for its whole
//! lifetime so that clearing the artifact directory never overlaps it.
//!
//! [`run`] wraps the individual tasks and turns any error into a failed
//! [`GenerationResult`], so a dispatched request always yields one result.

use crate::error::AppError;
use crate::orchestrator::backends::{
    GeneratedInputs, GenerationBackend, ImageBackend, TextBackend, VideoBackend,
};
use crate::orchestrator::constants::EDITED_VARIANT;
use crate::orchestrator::poller::JobPoller;
use crate::services::artifacts::{image_extension, Artifact, ArtifactKind, ArtifactStore};
use serde::{Deserialize, Serialize};

/// Upstream capability a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// Copy text and prompts from an objective
    Text,
    /// New image from a prompt
    Image,
    /// Edit of an existing image artifact
    ImageEdit,
    /// Video through an asynchronous job
    Video,
}

/// One unit of work dispatched to a generation task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Prompt (or objective, for text)
    pub prompt: String,
    /// Template label; `None` is the unlabeled default
    pub variant: Option<String>,
    /// Capability to call
    pub kind: GenerationKind,
    /// Existing artifact to edit (image edit only)
    pub source: Option<String>,
}

impl GenerationRequest {
    /// Request for a text, image or video generation
    pub fn new(prompt: impl Into<String>, variant: Option<String>, kind: GenerationKind) -> Self {
        Self {
            prompt: prompt.into(),
            variant,
            kind,
            source: None,
        }
    }

    /// Request to edit an existing artifact
    pub fn edit(prompt: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            variant: Some(EDITED_VARIANT.to_string()),
            kind: GenerationKind::ImageEdit,
            source: Some(source.into()),
        }
    }
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Artifact persisted and reachable at `url`
    Success {
        /// Artifact URL
        url: String,
    },
    /// Task failed
    Failure {
        /// Error description
        message: String,
    },
}

/// Settled result of one generation task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Template label of the request
    pub variant: Option<String>,
    /// Capability that was called
    pub kind: GenerationKind,
    /// Success or failure
    pub outcome: Outcome,
}

impl GenerationResult {
    /// Whether the task produced an artifact
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// Everything a task needs besides its request
pub struct TaskContext<'a, B: ?Sized> {
    /// Upstream backend
    pub backend: &'a B,
    /// Shared artifact directory
    pub store: &'a ArtifactStore,
    /// Video job poller
    pub poller: &'a JobPoller,
}

/// Run one request to completion and capture its outcome
pub async fn run<B>(ctx: &TaskContext<'_, B>, request: GenerationRequest) -> GenerationResult
where
    B: GenerationBackend + ?Sized,
{
    let variant = request.variant.as_deref();
    let result = match request.kind {
        GenerationKind::Text => generate_text(ctx.backend, ctx.store, &request.prompt).await,
        GenerationKind::Image => {
            generate_image(ctx.backend, ctx.store, &request.prompt, variant).await
        }
        GenerationKind::ImageEdit => match request.source.as_deref() {
            Some(source) => edit_image(ctx.backend, ctx.store, &request.prompt, source).await,
            None => Err(AppError::InvalidRequest(
                "Image edit requires a source artifact".to_string(),
            )),
        },
        GenerationKind::Video => {
            generate_video(ctx.backend, ctx.store, ctx.poller, &request.prompt, variant).await
        }
    };

    let outcome = match result {
        Ok(artifact) => Outcome::Success { url: artifact.url },
        Err(e) => {
            tracing::warn!(
                variant = ?request.variant,
                kind = ?request.kind,
                error = %e,
                "Generation task failed"
            );
            Outcome::Failure {
                message: e.to_string(),
            }
        }
    };

    GenerationResult {
        variant: request.variant,
        kind: request.kind,
        outcome,
    }
}

/// Ask the text backend for copy text and prompts
pub async fn generate_inputs<B>(backend: &B, objectives: &str) -> Result<GeneratedInputs, AppError>
where
    B: TextBackend + ?Sized,
{
    let inputs = backend.generate_inputs(objectives).await?;
    tracing::info!(
        copy_text_main = %inputs.copy_text_main,
        "Generated inputs"
    );
    Ok(inputs)
}

/// Generate copy text and persist it as a JSON artifact
pub async fn generate_text<B>(
    backend: &B,
    store: &ArtifactStore,
    objectives: &str,
) -> Result<Artifact, AppError>
where
    B: TextBackend + ?Sized,
{
    let _guard = store.begin_task().await;
    let inputs = generate_inputs(backend, objectives).await?;
    let bytes = serde_json::to_vec_pretty(&inputs)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode inputs: {}", e)))?;
    Ok(store
        .persist(ArtifactKind::Text, None, "json", &bytes)
        .await?)
}

/// Generate one image and persist it
pub async fn generate_image<B>(
    backend: &B,
    store: &ArtifactStore,
    prompt: &str,
    variant: Option<&str>,
) -> Result<Artifact, AppError>
where
    B: ImageBackend + ?Sized,
{
    let _guard = store.begin_task().await;
    tracing::info!(variant = ?variant, prompt = %prompt, "Generating image");

    let bytes = backend.generate_image(prompt).await?;
    let artifact = store
        .persist(ArtifactKind::Image, variant, image_extension(&bytes), &bytes)
        .await?;

    tracing::info!(variant = ?variant, artifact = %artifact.name, "Image generated");
    Ok(artifact)
}

/// Edit an artifact created by this process
///
/// The edited bytes are written to a new artifact; the source is left intact.
pub async fn edit_image<B>(
    backend: &B,
    store: &ArtifactStore,
    prompt: &str,
    source: &str,
) -> Result<Artifact, AppError>
where
    B: ImageBackend + ?Sized,
{
    let _guard = store.begin_task().await;
    let source_name = store.resolve(source)?;
    let original = store.read(&source_name).await?;

    tracing::info!(source = %source_name, prompt = %prompt, "Editing image");

    let edited = backend.edit_image(prompt, original, &source_name).await?;
    let artifact = store
        .persist(
            ArtifactKind::Image,
            Some(EDITED_VARIANT),
            image_extension(&edited),
            &edited,
        )
        .await?;

    tracing::info!(source = %source_name, artifact = %artifact.name, "Image edited");
    Ok(artifact)
}

/// Submit a video job, poll it to completion, fetch and persist the video
pub async fn generate_video<B>(
    backend: &B,
    store: &ArtifactStore,
    poller: &JobPoller,
    prompt: &str,
    variant: Option<&str>,
) -> Result<Artifact, AppError>
where
    B: VideoBackend + ?Sized,
{
    let _guard = store.begin_task().await;
    tracing::info!(variant = ?variant, prompt = %prompt, "Submitting video job");

    let job = backend.submit_video(prompt).await?;
    let job_id = job.id.clone();
    tracing::info!(job_id = %job_id, status = %job.status, "Video job submitted");

    let generation_id = poller.wait_for_completion(backend, job).await?;
    let bytes = backend.video_content(&generation_id).await?;
    let artifact = store
        .persist(ArtifactKind::Video, variant, "mp4", &bytes)
        .await?;

    tracing::info!(
        job_id = %job_id,
        generation_id = %generation_id,
        artifact = %artifact.name,
        "Video generated"
    );
    Ok(artifact)
}
