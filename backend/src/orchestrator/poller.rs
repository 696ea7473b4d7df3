//! Video job poller
//!
//! Drives an upstream video job from submission to a terminal state:
//!
//! ```text
//! submitted -> {queued, preprocessing, running, processing} -> {succeeded, failed, cancelled}
//! ```
//!
//! While the job is not terminal the poller waits a fixed interval and
//! re-queries the status. Patience is bounded by a maximum number of
//! status checks, after which the job is reported as timed out.

use crate::orchestrator::backends::{VideoBackend, VideoJob};
use crate::orchestrator::config::PollerConfig;
use crate::orchestrator::error::PollError;
use crate::orchestrator::openai_types::JobStatus;
use std::time::Duration;

/// Bounded fixed-interval job poller
#[derive(Debug, Clone)]
pub struct JobPoller {
    interval: Duration,
    max_attempts: u32,
}

impl JobPoller {
    /// Build a poller from configuration
    pub fn new(config: &PollerConfig) -> Self {
        Self::with_interval(config.interval(), config.max_attempts)
    }

    /// Build a poller with an explicit interval and attempt budget
    pub fn with_interval(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Poll `job` until it is terminal and return its first generation id
    ///
    /// `job` is the snapshot returned by submission; if it is already
    /// terminal no status query is made.
    ///
    /// # Errors
    /// * [`PollError::JobFailed`] - the job ended `failed` or `cancelled`
    /// * [`PollError::NoOutput`] - the job succeeded without generations
    /// * [`PollError::TimedOut`] - the attempt budget ran out
    /// * [`PollError::Upstream`] - a status query failed
    pub async fn wait_for_completion<B>(
        &self,
        backend: &B,
        mut job: VideoJob,
    ) -> Result<String, PollError>
    where
        B: VideoBackend + ?Sized,
    {
        let job_id = job.id.clone();
        let mut attempts = 0u32;

        while !job.status.is_terminal() {
            if attempts >= self.max_attempts {
                return Err(PollError::TimedOut {
                    job_id,
                    status: job.status.to_string(),
                    attempts,
                });
            }

            tokio::time::sleep(self.interval).await;
            attempts += 1;

            job = backend.video_status(&job_id).await?;

            tracing::debug!(
                job_id = %job_id,
                status = %job.status,
                attempt = attempts,
                "Video job status"
            );
        }

        if job.status == JobStatus::Succeeded {
            return job.generations.into_iter().next().ok_or_else(|| {
                tracing::warn!(job_id = %job_id, "Video job succeeded with no generations");
                PollError::NoOutput(job_id.clone())
            });
        }

        tracing::warn!(
            job_id = %job_id,
            status = %job.status,
            "Video job ended without output"
        );
        Err(PollError::JobFailed {
            job_id,
            payload: job.payload.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::backends::fakes::{job, ScriptedBackend};
    use std::sync::atomic::Ordering;

    fn fast_poller(max_attempts: u32) -> JobPoller {
        JobPoller::with_interval(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn test_queued_running_succeeded() {
        let backend = ScriptedBackend::with_statuses(vec![
            job(JobStatus::Running, &[]),
            job(JobStatus::Succeeded, &["gen-1"]),
        ]);

        let generation = fast_poller(10)
            .wait_for_completion(&backend, job(JobStatus::Queued, &[]))
            .await
            .expect("Job should succeed");

        assert_eq!(generation, "gen-1");
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_terminal_submission_skips_status_queries() {
        let backend = ScriptedBackend::default();

        let generation = fast_poller(10)
            .wait_for_completion(&backend, job(JobStatus::Succeeded, &["gen-0"]))
            .await
            .expect("Job should succeed");

        assert_eq!(generation, "gen-0");
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let backend = ScriptedBackend::with_statuses(vec![
            job(JobStatus::Unknown, &[]),
            job(JobStatus::Succeeded, &["gen-2"]),
        ]);

        let generation = fast_poller(10)
            .wait_for_completion(&backend, job(JobStatus::Unknown, &[]))
            .await
            .expect("Job should succeed");

        assert_eq!(generation, "gen-2");
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_queued_failed_surfaces_payload() {
        let backend = ScriptedBackend::with_statuses(vec![job(JobStatus::Failed, &[])]);

        let result = fast_poller(10)
            .wait_for_completion(&backend, job(JobStatus::Queued, &[]))
            .await;

        match result {
            Err(PollError::JobFailed { job_id, payload }) => {
                assert_eq!(job_id, "job-1");
                assert!(payload.contains("\"status\":\"failed\""), "got: {}", payload);
            }
            other => panic!("Expected JobFailed, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_succeeded_without_generations_is_failure() {
        let backend = ScriptedBackend::default();

        let result = fast_poller(10)
            .wait_for_completion(&backend, job(JobStatus::Succeeded, &[]))
            .await;

        assert!(matches!(result, Err(PollError::NoOutput(_))));
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_is_failure() {
        let backend = ScriptedBackend::with_statuses(vec![job(JobStatus::Cancelled, &[])]);

        let result = fast_poller(10)
            .wait_for_completion(&backend, job(JobStatus::Running, &[]))
            .await;

        assert!(matches!(result, Err(PollError::JobFailed { .. })));
    }

    #[tokio::test]
    async fn test_attempt_budget_exhausted() {
        let backend = ScriptedBackend::with_statuses(vec![
            job(JobStatus::Running, &[]),
            job(JobStatus::Running, &[]),
            job(JobStatus::Running, &[]),
        ]);

        let result = fast_poller(2)
            .wait_for_completion(&backend, job(JobStatus::Queued, &[]))
            .await;

        match result {
            Err(PollError::TimedOut {
                attempts, status, ..
            }) => {
                assert_eq!(attempts, 2);
                assert_eq!(status, "running");
            }
            other => panic!("Expected TimedOut, got: {:?}", other),
        }
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_status_query_error_propagates() {
        // No scripted statuses: the first status query fails.
        let backend = ScriptedBackend::default();

        let result = fast_poller(10)
            .wait_for_completion(&backend, job(JobStatus::Queued, &[]))
            .await;

        assert!(matches!(result, Err(PollError::Upstream(_))));
    }

    #[test]
    fn test_new_uses_config_interval() {
        let poller = JobPoller::new(&PollerConfig::default());
        assert_eq!(poller.interval, Duration::from_secs(5));
        assert_eq!(poller.max_attempts, 120);
    }
}
