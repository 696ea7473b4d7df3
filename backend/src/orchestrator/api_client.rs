//! Azure OpenAI API client
//!
//! Direct HTTP client for the chat completion, image and video job
//! endpoints of an Azure OpenAI resource. One client is built at startup
//! and shared, so connections are pooled across concurrent tasks.

use crate::config::UpstreamConfig;
use crate::orchestrator::backends::{
    GeneratedInputs, ImageBackend, TextBackend, VideoBackend, VideoJob,
};
use crate::orchestrator::error::UpstreamError;
use crate::orchestrator::openai_types::{
    ApiEnvelope, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ImageGenerationRequest, ImageResponse, JsonSchemaSpec, ResponseFormat, VideoJobRequest,
    VideoJobResponse,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use std::time::Duration;

const INPUTS_SYSTEM_PROMPT: &str = "You are an AI that designs in-store POP (point of purchase) \
advertisements. From the objective below, write the copy text in Japanese: a short main line and \
a supporting sub line. Then write a background image generation prompt and a short video \
generation prompt in English, each with a Japanese translation.";

/// Azure OpenAI client implementing every generation capability
pub struct AzureClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl AzureClient {
    /// Build a client with a per-request timeout taken from the config
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.config.endpoint, deployment, operation, self.config.api_version
        )
    }

    fn video_url(&self, path: &str) -> String {
        format!(
            "{}/openai/v1/video/generations/{}?api-version={}",
            self.config.endpoint, path, self.config.video_api_version
        )
    }

    /// Send a request and fail on non-success statuses
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<reqwest::Response, UpstreamError> {
        let response = request
            .header("api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                UpstreamError::Transport(format!("Failed to send {} request: {}", operation, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                operation = operation,
                status_code = status.as_u16(),
                error_body = %body,
                "Upstream returned error status"
            );

            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Read a JSON body, recognising error payloads
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<T, UpstreamError> {
        let body = response.text().await.map_err(|e| {
            UpstreamError::Transport(format!("Failed to read {} response body: {}", operation, e))
        })?;

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::Malformed(format!(
                "Failed to parse {} response: {} - Response body: {}",
                operation, e, body
            ))
        })?;

        envelope.into_result()
    }

    async fn read_video_job(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<VideoJob, UpstreamError> {
        let payload: serde_json::Value = Self::read_json(response, operation).await?;
        let job: VideoJobResponse = serde_json::from_value(payload.clone()).map_err(|e| {
            UpstreamError::Malformed(format!(
                "Unexpected {} payload: {} - {}",
                operation, e, payload
            ))
        })?;

        Ok(VideoJob {
            id: job.id,
            status: job.status,
            generations: job.generations.into_iter().map(|g| g.id).collect(),
            payload,
        })
    }

    fn first_image(response: ImageResponse, operation: &str) -> Result<Vec<u8>, UpstreamError> {
        let encoded = response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| {
                UpstreamError::Empty(format!("{} response contains no image data", operation))
            })?;

        STANDARD.decode(encoded.trim()).map_err(|e| {
            UpstreamError::Malformed(format!("{} returned invalid base64: {}", operation, e))
        })
    }
}

/// JSON schema the chat completion must follow
fn inputs_schema() -> serde_json::Value {
    let fields = [
        "copy_text_main",
        "copy_text_sub",
        "image_prompt_en",
        "image_prompt_ja",
        "video_prompt_en",
        "video_prompt_ja",
    ];
    let properties: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|f| (f.to_string(), serde_json::json!({ "type": "string" })))
        .collect();

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": fields,
        "additionalProperties": false,
    })
}

#[async_trait]
impl TextBackend for AzureClient {
    async fn generate_inputs(&self, objectives: &str) -> Result<GeneratedInputs, UpstreamError> {
        let url = self.deployment_url(&self.config.chat_deployment, "chat/completions");
        let request_body = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: INPUTS_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Objective: {}", objectives),
                },
            ],
            max_tokens: 1000,
            temperature: 0.7,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaSpec {
                    name: "generated_copy_text".to_string(),
                    strict: true,
                    schema: inputs_schema(),
                },
            },
        };

        tracing::debug!(
            deployment = %self.config.chat_deployment,
            objectives_len = objectives.len(),
            "Calling chat completion"
        );

        let response = self
            .send(self.http.post(&url).json(&request_body), "chat completion")
            .await?;
        let parsed: ChatCompletionResponse = Self::read_json(response, "chat completion").await?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Empty("chat completion contains no choices".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(UpstreamError::Rejected {
                code: "refusal".to_string(),
                message: refusal,
            });
        }

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                UpstreamError::Empty(format!(
                    "chat completion has no content (finish_reason: {})",
                    choice.finish_reason.as_deref().unwrap_or("none")
                ))
            })?;

        serde_json::from_str(&content).map_err(|e| {
            UpstreamError::Malformed(format!(
                "Chat completion content does not match the schema: {} - {}",
                e, content
            ))
        })
    }
}

#[async_trait]
impl ImageBackend for AzureClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, UpstreamError> {
        let url = self.deployment_url(&self.config.image_deployment, "images/generations");
        let request_body = ImageGenerationRequest {
            prompt: prompt.to_string(),
            size: self.config.image_size.clone(),
            n: 1,
        };

        tracing::debug!(
            deployment = %self.config.image_deployment,
            prompt_len = prompt.len(),
            "Calling image generation"
        );

        let response = self
            .send(self.http.post(&url).json(&request_body), "image generation")
            .await?;
        let parsed: ImageResponse = Self::read_json(response, "image generation").await?;
        Self::first_image(parsed, "image generation")
    }

    async fn edit_image(
        &self,
        prompt: &str,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<u8>, UpstreamError> {
        let url = self.deployment_url(&self.config.image_deployment, "images/edits");
        let mime = if file_name.ends_with(".jpg") || file_name.ends_with(".jpeg") {
            "image/jpeg"
        } else {
            "image/png"
        };
        let image_part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new()
            .part("image", image_part)
            .text("prompt", prompt.to_string())
            .text("size", self.config.image_size.clone())
            .text("n", "1");

        tracing::debug!(
            deployment = %self.config.image_deployment,
            file_name = %file_name,
            prompt_len = prompt.len(),
            "Calling image edit"
        );

        let response = self
            .send(self.http.post(&url).multipart(form), "image edit")
            .await?;
        let parsed: ImageResponse = Self::read_json(response, "image edit").await?;
        Self::first_image(parsed, "image edit")
    }
}

#[async_trait]
impl VideoBackend for AzureClient {
    async fn submit_video(&self, prompt: &str) -> Result<VideoJob, UpstreamError> {
        let url = self.video_url("jobs");
        let request_body = VideoJobRequest {
            model: self.config.video_deployment.clone(),
            prompt: prompt.to_string(),
            width: self.config.video_width.to_string(),
            height: self.config.video_height.to_string(),
            n_seconds: self.config.video_seconds,
            n_variants: 1,
        };

        tracing::debug!(
            model = %self.config.video_deployment,
            prompt_len = prompt.len(),
            "Submitting video job"
        );

        let response = self
            .send(self.http.post(&url).json(&request_body), "video submit")
            .await?;
        Self::read_video_job(response, "video submit").await
    }

    async fn video_status(&self, job_id: &str) -> Result<VideoJob, UpstreamError> {
        let url = self.video_url(&format!("jobs/{}", job_id));
        let response = self.send(self.http.get(&url), "video status").await?;
        Self::read_video_job(response, "video status").await
    }

    async fn video_content(&self, generation_id: &str) -> Result<Vec<u8>, UpstreamError> {
        let url = self.video_url(&format!("{}/content/video", generation_id));
        let response = self.send(self.http.get(&url), "video content").await?;
        let bytes = response.bytes().await.map_err(|e| {
            UpstreamError::Transport(format!("Failed to read video content: {}", e))
        })?;

        if bytes.is_empty() {
            return Err(UpstreamError::Empty(format!(
                "generation {} has no content",
                generation_id
            )));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::openai_types::JobStatus;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    fn test_config(endpoint: &str) -> UpstreamConfig {
        UpstreamConfig {
            endpoint: endpoint.to_string(),
            api_key: "test-key".to_string(),
            api_version: "2025-04-01-preview".to_string(),
            chat_deployment: "gpt-4o".to_string(),
            image_deployment: "gpt-image-1".to_string(),
            video_deployment: "sora".to_string(),
            video_api_version: "preview".to_string(),
            image_size: "1024x1024".to_string(),
            video_width: 480,
            video_height: 480,
            video_seconds: 5,
            request_timeout_secs: 10,
        }
    }

    fn api_version(v: &str) -> Matcher {
        Matcher::UrlEncoded("api-version".into(), v.into())
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_inputs_success() {
        let mut server = Server::new_async().await;
        let content = serde_json::json!({
            "copy_text_main": "夏の大セール",
            "copy_text_sub": "全品20%オフ",
            "image_prompt_en": "sunny beach storefront",
            "image_prompt_ja": "晴れたビーチの店頭",
            "video_prompt_en": "waves rolling past a storefront",
            "video_prompt_ja": "店頭の前を波が流れる",
        })
        .to_string();
        let body = serde_json::json!({
            "choices": [{ "message": { "content": content }, "finish_reason": "stop" }]
        });
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(api_version("2025-04-01-preview"))
            .match_header("api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "response_format": { "type": "json_schema" }
            })))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let inputs = client.generate_inputs("Summer sale").await.unwrap();

        mock.assert_async().await;
        assert_eq!(inputs.copy_text_main, "夏の大セール");
        assert_eq!(inputs.video_prompt_en, "waves rolling past a storefront");
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_inputs_content_not_matching_schema() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "{\"copy_text_main\": \"x\"}"}}]}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let result = client.generate_inputs("Summer sale").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(UpstreamError::Malformed(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_inputs_no_choices() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let result = client.generate_inputs("Summer sale").await;

        mock.assert_async().await;
        let error_msg = result.unwrap_err().to_string();
        assert!(error_msg.contains("no choices"), "got: {}", error_msg);
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_image_decodes_base64() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-image-1/images/generations")
            .match_query(api_version("2025-04-01-preview"))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "prompt": "a storefront",
                "size": "1024x1024",
                "n": 1
            })))
            .with_status(200)
            .with_body(r#"{"data": [{"b64_json": "aGVsbG8="}]}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let bytes = client.generate_image("a storefront").await.unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_image_error_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-image-1/images/generations")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error": {"code": "429", "message": "Rate limit exceeded"}}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let result = client.generate_image("a storefront").await;

        mock.assert_async().await;
        match result {
            Err(UpstreamError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("Rate limit"));
            }
            other => panic!("Expected Status error, got: {:?}", other),
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_image_error_payload_with_ok_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-image-1/images/generations")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": {"code": "content_policy_violation", "message": "Blocked"}}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let result = client.generate_image("a storefront").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(UpstreamError::Rejected { .. })));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_image_missing_data() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-image-1/images/generations")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let result = client.generate_image("a storefront").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(UpstreamError::Empty(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_image_invalid_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-image-1/images/generations")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("This is not JSON")
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let result = client.generate_image("a storefront").await;

        mock.assert_async().await;
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }

    #[tokio::test]
    #[serial]
    async fn test_edit_image_sends_multipart() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-image-1/images/edits")
            .match_query(api_version("2025-04-01-preview"))
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex("make it blue".to_string()))
            .with_status(200)
            .with_body(r#"{"data": [{"b64_json": "ZWRpdGVk"}]}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let bytes = client
            .edit_image("make it blue", b"original".to_vec(), "pop_image_a.png")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"edited");
    }

    #[tokio::test]
    #[serial]
    async fn test_video_submit_status_and_content() {
        let mut server = Server::new_async().await;
        let submit = server
            .mock("POST", "/openai/v1/video/generations/jobs")
            .match_query(api_version("preview"))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "sora",
                "width": "480",
                "height": "480",
                "n_seconds": 5
            })))
            .with_status(201)
            .with_body(r#"{"id": "task_1", "status": "queued"}"#)
            .create_async()
            .await;
        let status = server
            .mock("GET", "/openai/v1/video/generations/jobs/task_1")
            .match_query(api_version("preview"))
            .with_status(200)
            .with_body(
                r#"{"id": "task_1", "status": "succeeded", "generations": [{"id": "gen_1"}]}"#,
            )
            .create_async()
            .await;
        let content = server
            .mock("GET", "/openai/v1/video/generations/gen_1/content/video")
            .match_query(api_version("preview"))
            .with_status(200)
            .with_body("mp4-bytes")
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();

        let job = client.submit_video("waves").await.unwrap();
        assert_eq!(job.id, "task_1");
        assert_eq!(job.status, JobStatus::Queued);

        let job = client.video_status("task_1").await.unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.generations, vec!["gen_1".to_string()]);
        assert_eq!(job.payload["generations"][0]["id"], "gen_1");

        let bytes = client.video_content("gen_1").await.unwrap();
        assert_eq!(bytes, b"mp4-bytes");

        submit.assert_async().await;
        status.assert_async().await;
        content.assert_async().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_video_status_missing_id_is_malformed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/openai/v1/video/generations/jobs/task_1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "running"}"#)
            .create_async()
            .await;

        let client = AzureClient::new(test_config(&server.url())).unwrap();
        let result = client.video_status("task_1").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(UpstreamError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = AzureClient::new(test_config("http://127.0.0.1:9")).unwrap();
        let result = client.generate_image("a storefront").await;
        assert!(matches!(result, Err(UpstreamError::Transport(_))));
    }
}
