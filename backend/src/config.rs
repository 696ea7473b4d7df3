//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. The configuration is read once at startup and
//! shared immutably with every component that talks to an upstream service.

use crate::orchestrator::config::{LimitsConfig, PollerConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Upstream generative API configuration
    pub upstream: UpstreamConfig,
    /// Artifact storage configuration
    pub storage: StorageConfig,
    /// Video job polling configuration
    pub poller: PollerConfig,
    /// Request validation limits
    pub limits: LimitsConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Azure OpenAI deployment configuration
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Resource endpoint, without trailing slash
    pub endpoint: String,
    /// API key sent in the `api-key` header
    pub api_key: String,
    /// API version for chat and image deployments
    pub api_version: String,
    /// Chat completion deployment name
    pub chat_deployment: String,
    /// Image generation/edit deployment name
    pub image_deployment: String,
    /// Video generation model name
    pub video_deployment: String,
    /// API version for the video job endpoints
    pub video_api_version: String,
    /// Requested image size (e.g. "1024x1024")
    pub image_size: String,
    /// Requested video width in pixels
    pub video_width: u32,
    /// Requested video height in pixels
    pub video_height: u32,
    /// Requested video length in seconds
    pub video_seconds: u32,
    /// Timeout for a single upstream HTTP request
    pub request_timeout_secs: u64,
}

// Keep the key out of logs.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("chat_deployment", &self.chat_deployment)
            .field("image_deployment", &self.image_deployment)
            .field("video_deployment", &self.video_deployment)
            .field("video_api_version", &self.video_api_version)
            .field("image_size", &self.image_size)
            .field("video_width", &self.video_width)
            .field("video_height", &self.video_height)
            .field("video_seconds", &self.video_seconds)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Artifact storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Shared directory generated artifacts are written to
    pub artifact_dir: PathBuf,
    /// Template catalog file
    pub template_path: PathBuf,
    /// Optional directory holding the browser UI
    pub static_dir: Option<PathBuf>,
    /// Clear the artifact directory when the process starts
    pub clear_on_start: bool,
}

/// Configuration errors detected at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// A value is present but unusable
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Parse a variable into its target type; out-of-range values count as unparseable
fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable numeric values fall back to their defaults, matching
    /// the behavior of [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let poller_defaults = PollerConfig::default();
        let limits_defaults = LimitsConfig::default();

        Self {
            server: ServerConfig {
                port: parse_var(&lookup, "PORT").unwrap_or(3000),
                host: string("HOST", "0.0.0.0"),
            },
            upstream: UpstreamConfig {
                endpoint: string("AOAI_ENDPOINT", "")
                    .trim_end_matches('/')
                    .to_string(),
                api_key: string("AOAI_KEY", ""),
                api_version: string("AOAI_API_VERSION", ""),
                chat_deployment: string("AOAI_CHAT_DEPLOYMENT_NAME", ""),
                image_deployment: string("AOAI_IMAGE_DEPLOYMENT_NAME", ""),
                video_deployment: string("AOAI_VIDEO_DEPLOYMENT_NAME", "sora"),
                video_api_version: string("AOAI_VIDEO_API_VERSION", "preview"),
                image_size: string("IMAGE_SIZE", "1024x1024"),
                video_width: parse_var(&lookup, "VIDEO_WIDTH").unwrap_or(480),
                video_height: parse_var(&lookup, "VIDEO_HEIGHT").unwrap_or(480),
                video_seconds: parse_var(&lookup, "VIDEO_SECONDS").unwrap_or(5),
                request_timeout_secs: parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS").unwrap_or(120),
            },
            storage: StorageConfig {
                artifact_dir: PathBuf::from(string("ARTIFACT_DIR", "./tmp")),
                template_path: PathBuf::from(string("TEMPLATE_PATH", "./template.json")),
                static_dir: lookup("STATIC_DIR")
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from),
                clear_on_start: lookup("CLEAR_TEMP_ON_START")
                    .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
                    .unwrap_or(true),
            },
            poller: PollerConfig {
                interval_secs: parse_var(&lookup, "VIDEO_POLL_INTERVAL_SECS")
                    .unwrap_or(poller_defaults.interval_secs),
                max_attempts: parse_var(&lookup, "VIDEO_POLL_MAX_ATTEMPTS")
                    .unwrap_or(poller_defaults.max_attempts),
            },
            limits: LimitsConfig {
                max_prompt_length: parse_var(&lookup, "MAX_PROMPT_LENGTH")
                    .unwrap_or(limits_defaults.max_prompt_length),
                max_variants: parse_var(&lookup, "MAX_VARIANTS")
                    .unwrap_or(limits_defaults.max_variants),
            },
        }
    }

    /// Check that everything needed to reach the upstream service is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("AOAI_ENDPOINT", &self.upstream.endpoint),
            ("AOAI_KEY", &self.upstream.api_key),
            ("AOAI_API_VERSION", &self.upstream.api_version),
            ("AOAI_CHAT_DEPLOYMENT_NAME", &self.upstream.chat_deployment),
            ("AOAI_IMAGE_DEPLOYMENT_NAME", &self.upstream.image_deployment),
        ];
        for (key, value) in required {
            if value.is_empty() {
                return Err(ConfigError::Missing(key));
            }
        }

        if !self.upstream.endpoint.starts_with("http://")
            && !self.upstream.endpoint.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                key: "AOAI_ENDPOINT",
                reason: "must be an http(s) URL".to_string(),
            });
        }
        if self.poller.interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "VIDEO_POLL_INTERVAL_SECS",
                reason: "must be > 0".to_string(),
            });
        }
        if self.poller.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "VIDEO_POLL_MAX_ATTEMPTS",
                reason: "must be > 0".to_string(),
            });
        }
        if self.limits.max_variants == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_VARIANTS",
                reason: "must be > 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
