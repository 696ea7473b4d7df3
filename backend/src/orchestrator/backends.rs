//! Upstream capability traits
//!
//! Each generative capability is consumed through a narrow trait so that
//! generation tasks, the job poller and the fan-out coordinator can be
//! exercised against scripted backends. [`AzureClient`] implements all of
//! them against Azure OpenAI.
//!
//! [`AzureClient`]: crate::orchestrator::api_client::AzureClient

use crate::orchestrator::error::UpstreamError;
use crate::orchestrator::openai_types::JobStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured copy and prompt strings derived from a free-text objective
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedInputs {
    /// Main copy line printed on the POP
    pub copy_text_main: String,
    /// Secondary copy line
    pub copy_text_sub: String,
    /// Image prompt in English
    pub image_prompt_en: String,
    /// Image prompt in Japanese
    pub image_prompt_ja: String,
    /// Video prompt in English
    pub video_prompt_en: String,
    /// Video prompt in Japanese
    pub video_prompt_ja: String,
}

/// Snapshot of an upstream video job
#[derive(Debug, Clone)]
pub struct VideoJob {
    /// Opaque identifier assigned by the upstream service
    pub id: String,
    /// Reported status
    pub status: JobStatus,
    /// Generation identifiers (only populated once succeeded)
    pub generations: Vec<String>,
    /// Status payload exactly as reported
    pub payload: serde_json::Value,
}

/// Text completion capability
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Turn an objective into copy text and prompts
    async fn generate_inputs(&self, objectives: &str) -> Result<GeneratedInputs, UpstreamError>;
}

/// Image generation and edit capability
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Generate one image and return its bytes
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, UpstreamError>;

    /// Edit an existing image and return the new bytes
    async fn edit_image(
        &self,
        prompt: &str,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<u8>, UpstreamError>;
}

/// Asynchronous video generation capability
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Submit a job; the returned snapshot is the poller's initial state
    async fn submit_video(&self, prompt: &str) -> Result<VideoJob, UpstreamError>;

    /// Query the current status of a job
    async fn video_status(&self, job_id: &str) -> Result<VideoJob, UpstreamError>;

    /// Download the content of a completed generation
    async fn video_content(&self, generation_id: &str) -> Result<Vec<u8>, UpstreamError>;
}

/// Every capability the HTTP surface needs
pub trait GenerationBackend: TextBackend + ImageBackend + VideoBackend {}

impl<T> GenerationBackend for T where T: TextBackend + ImageBackend + VideoBackend {}
