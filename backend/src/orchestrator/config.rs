//! Orchestrator configuration
//!
//! Polling and request-limit settings for generation workflows.

use serde::Serialize;
use std::time::Duration;

/// Video job polling configuration
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PollerConfig {
    /// Fixed delay between two status queries, in seconds
    pub interval_secs: u64,
    /// Maximum number of status queries before giving up
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 120, // 10 minutes at the default interval
        }
    }
}

impl PollerConfig {
    /// Delay between two status queries
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Request validation limits
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Maximum prompt/objective length in characters
    pub max_prompt_length: usize,
    /// Maximum number of template variants in one batch
    pub max_variants: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_prompt_length: 10_000,
            max_variants: 3,
        }
    }
}
