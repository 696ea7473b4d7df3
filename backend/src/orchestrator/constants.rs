//! Orchestrator constants
//!
//! Centralized constants used throughout the orchestrator module.

/// SSE stream termination signal
pub const SSE_DONE_SIGNAL: &str = "[DONE]";

/// SSE error prefix
pub const SSE_ERROR_PREFIX: &str = "[ERROR]";

/// Background color every templated prompt asks for
pub const DOMINANT_COLOR: &str = "#FFFFFF";

/// Variant label given to edited images
pub const EDITED_VARIANT: &str = "edited";
