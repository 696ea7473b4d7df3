//! Generation-specific error types
//!
//! Errors raised while talking to the upstream generative service and while
//! driving video jobs to completion.

use thiserror::Error;

/// Errors returned by an upstream generative backend
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The request never produced an HTTP response (connect, timeout, TLS)
    #[error("Upstream request failed: {0}")]
    Transport(String),

    /// The upstream service answered with a non-success status
    #[error("Upstream returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The upstream service answered with an error payload
    #[error("Upstream rejected the request ({code}): {message}")]
    Rejected {
        /// Error code reported by the service
        code: String,
        /// Error message reported by the service
        message: String,
    },

    /// The response did not have the expected shape
    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    /// The response was well-formed but carried no usable content
    #[error("Upstream response is empty: {0}")]
    Empty(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Transport(e.to_string())
    }
}

/// Errors that end a video job without an artifact
#[derive(Error, Debug)]
pub enum PollError {
    /// Submitting the job or querying its status failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The job reached `failed` or `cancelled`
    #[error("Video job {job_id} failed: {payload}")]
    JobFailed {
        /// Upstream job identifier
        job_id: String,
        /// Status payload as reported by the upstream service
        payload: String,
    },

    /// The job reached `succeeded` but reported no generations
    #[error("Video job {0} succeeded with no output")]
    NoOutput(String),

    /// The job did not reach a terminal state within the attempt budget
    #[error("Video job {job_id} still {status} after {attempts} status checks")]
    TimedOut {
        /// Upstream job identifier
        job_id: String,
        /// Last reported status
        status: String,
        /// Number of status checks performed
        attempts: u32,
    },
}
