//! Azure OpenAI request and response types
//!
//! Structs that mirror the Azure OpenAI REST JSON format.
//! Responses are wrapped in [`ApiEnvelope`] so that an error payload is
//! recognised at the boundary instead of failing as a missing field.

use crate::orchestrator::error::UpstreamError;
use serde::{Deserialize, Serialize};

/// Either the expected payload or an error body
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    /// `{"error": {...}}`
    Error {
        /// Error details
        error: ApiErrorBody,
    },
    /// The expected response
    Payload(T),
}

impl<T> ApiEnvelope<T> {
    /// Convert into a `Result`, turning error bodies into [`UpstreamError::Rejected`]
    pub fn into_result(self) -> Result<T, UpstreamError> {
        match self {
            ApiEnvelope::Payload(payload) => Ok(payload),
            ApiEnvelope::Error { error } => Err(UpstreamError::Rejected {
                code: error.code.unwrap_or_else(|| "unknown".to_string()),
                message: error.message.unwrap_or_default(),
            }),
        }
    }
}

/// Error body reported by the service
#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    /// Machine-readable error code
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat completion request
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Structured output format
    pub response_format: ResponseFormat,
}

/// A single chat message
#[derive(Serialize, Debug)]
pub struct ChatMessage {
    /// "system" or "user"
    pub role: String,
    /// Message text
    pub content: String,
}

/// Structured output format (always `json_schema` here)
#[derive(Serialize, Debug)]
pub struct ResponseFormat {
    /// Format type
    #[serde(rename = "type")]
    pub format_type: String,
    /// Schema the response must match
    pub json_schema: JsonSchemaSpec,
}

/// Named JSON schema
#[derive(Serialize, Debug)]
pub struct JsonSchemaSpec {
    /// Schema name
    pub name: String,
    /// Require strict adherence
    pub strict: bool,
    /// The schema document
    pub schema: serde_json::Value,
}

/// Chat completion response
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    /// Completion choices
    pub choices: Vec<ChatChoice>,
}

/// A single completion choice
#[derive(Deserialize, Debug)]
pub struct ChatChoice {
    /// Assistant message
    pub message: ChatChoiceMessage,
    /// Why the model stopped generating
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message of a choice
#[derive(Deserialize, Debug)]
pub struct ChatChoiceMessage {
    /// Text content (absent when the model refused)
    #[serde(default)]
    pub content: Option<String>,
    /// Refusal explanation, if any
    #[serde(default)]
    pub refusal: Option<String>,
}

/// Image generation request
#[derive(Serialize, Debug)]
pub struct ImageGenerationRequest {
    /// Text prompt
    pub prompt: String,
    /// Size such as "1024x1024"
    pub size: String,
    /// Number of images
    pub n: u32,
}

/// Response of both the generation and the edit endpoint
#[derive(Deserialize, Debug)]
pub struct ImageResponse {
    /// Generated images
    pub data: Vec<ImageDatum>,
}

/// One generated image
#[derive(Deserialize, Debug)]
pub struct ImageDatum {
    /// Base64-encoded image bytes
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// Video generation job request
#[derive(Serialize, Debug)]
pub struct VideoJobRequest {
    /// Model name
    pub model: String,
    /// Text prompt
    pub prompt: String,
    /// Width in pixels, as a string
    pub width: String,
    /// Height in pixels, as a string
    pub height: String,
    /// Length in seconds
    pub n_seconds: u32,
    /// Number of videos
    pub n_variants: u32,
}

/// Video job as reported by the submit and status endpoints
#[derive(Deserialize, Debug)]
pub struct VideoJobResponse {
    /// Opaque job identifier
    pub id: String,
    /// Current status tag
    pub status: JobStatus,
    /// Generated content records (present once succeeded)
    #[serde(default)]
    pub generations: Vec<GenerationRecord>,
}

/// Reference to one completed generation
#[derive(Deserialize, Debug, Clone)]
pub struct GenerationRecord {
    /// Generation identifier used to fetch the content
    pub id: String,
}

/// Video job status tag
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for capacity
    Queued,
    /// Prompt is being prepared
    Preprocessing,
    /// Generation in progress
    Running,
    /// Output is being post-processed
    Processing,
    /// Finished with output
    Succeeded,
    /// Finished with an error
    Failed,
    /// Cancelled upstream
    Cancelled,
    /// Any tag this client does not know about; treated as in progress
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether polling should stop
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Lowercase tag as used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Preprocessing => "preprocessing",
            JobStatus::Running => "running",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
