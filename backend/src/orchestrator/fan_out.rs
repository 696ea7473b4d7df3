//! Fan-out coordinator
//!
//! Launches one generation task per variant and reports each settlement
//! independently. Every variant gets a `Pending` event before any task
//! starts; `Settled` events follow in completion order, which need not match
//! input order. One task failing (or panicking) never affects its siblings,
//! and every request yields exactly one `Settled` event.

use crate::orchestrator::tasks::{GenerationRequest, GenerationResult, Outcome};
use futures_util::stream::{FuturesUnordered, Stream, StreamExt};
use futures_util::FutureExt;
use serde::Serialize;
use std::future::Future;

/// Progress of one variant
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VariantEvent {
    /// Task registered, not yet settled
    Pending {
        /// Position in the input list
        index: usize,
        /// Variant label
        variant: Option<String>,
    },
    /// Task finished
    Settled {
        /// Position in the input list
        index: usize,
        /// Task result
        result: GenerationResult,
    },
}

/// Turn selected template labels into variant slots
///
/// An empty selection becomes a single unlabeled default variant.
pub fn normalize_variants(labels: Vec<String>) -> Vec<Option<String>> {
    if labels.is_empty() {
        vec![None]
    } else {
        labels.into_iter().map(Some).collect()
    }
}

/// Run every request concurrently and stream per-variant progress
///
/// Tasks are spawned in input order. A task that panics is reported as a
/// failed result for its own variant.
pub fn fan_out<F, Fut>(
    requests: Vec<GenerationRequest>,
    run: F,
) -> impl Stream<Item = VariantEvent> + Send
where
    F: Fn(GenerationRequest) -> Fut + Send + 'static,
    Fut: Future<Output = GenerationResult> + Send + 'static,
{
    async_stream::stream! {
        for (index, request) in requests.iter().enumerate() {
            yield VariantEvent::Pending {
                index,
                variant: request.variant.clone(),
            };
        }

        tracing::debug!(variants = requests.len(), "Launching variant tasks");

        let mut in_flight = FuturesUnordered::new();
        for (index, request) in requests.into_iter().enumerate() {
            let variant = request.variant.clone();
            let kind = request.kind;
            let handle = tokio::spawn(run(request));
            in_flight.push(handle.map(move |joined| (index, variant, kind, joined)));
        }

        while let Some((index, variant, kind, joined)) = in_flight.next().await {
            let result = joined.unwrap_or_else(|e| {
                tracing::error!(index = index, variant = ?variant, error = %e, "Variant task aborted");
                GenerationResult {
                    variant,
                    kind,
                    outcome: Outcome::Failure {
                        message: format!("Task aborted: {}", e),
                    },
                }
            });
            yield VariantEvent::Settled { index, result };
        }
    }
}

/// Run every request concurrently and collect results in completion order
pub async fn fan_out_all<F, Fut>(requests: Vec<GenerationRequest>, run: F) -> Vec<GenerationResult>
where
    F: Fn(GenerationRequest) -> Fut + Send + 'static,
    Fut: Future<Output = GenerationResult> + Send + 'static,
{
    fan_out(requests, run)
        .filter_map(|event| async move {
            match event {
                VariantEvent::Settled { result, .. } => Some(result),
                VariantEvent::Pending { .. } => None,
            }
        })
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tasks::GenerationKind;
    use std::time::Duration;

    fn requests(labels: Vec<&str>) -> Vec<GenerationRequest> {
        normalize_variants(labels.into_iter().map(String::from).collect())
            .into_iter()
            .map(|variant| GenerationRequest::new("prompt", variant, GenerationKind::Image))
            .collect()
    }

    fn succeed(request: GenerationRequest) -> GenerationResult {
        GenerationResult {
            outcome: Outcome::Success {
                url: format!("/artifacts/{}", request.variant.as_deref().unwrap_or("default")),
            },
            variant: request.variant,
            kind: request.kind,
        }
    }

    #[test]
    fn test_normalize_empty_selection() {
        assert_eq!(normalize_variants(vec![]), vec![None]);
        assert_eq!(
            normalize_variants(vec!["A".to_string(), "B".to_string()]),
            vec![Some("A".to_string()), Some("B".to_string())]
        );
    }

    #[tokio::test]
    async fn test_result_count_is_max_n_1() {
        for labels in [vec![], vec!["A"], vec!["A", "B"], vec!["A", "B", "C"]] {
            let expected = labels.len().max(1);
            let results =
                fan_out_all(requests(labels), |r| async move { succeed(r) }).await;
            assert_eq!(results.len(), expected);
        }
    }

    #[tokio::test]
    async fn test_all_pending_before_any_settled() {
        let events: Vec<VariantEvent> =
            fan_out(requests(vec!["A", "B", "C"]), |r| async move { succeed(r) })
                .collect()
                .await;

        assert_eq!(events.len(), 6);
        for (i, event) in events.iter().take(3).enumerate() {
            match event {
                VariantEvent::Pending { index, .. } => assert_eq!(*index, i),
                other => panic!("Expected pending, got: {:?}", other),
            }
        }
        assert!(events[3..]
            .iter()
            .all(|e| matches!(e, VariantEvent::Settled { .. })));
    }

    #[tokio::test]
    async fn test_settles_in_completion_order() {
        let events: Vec<VariantEvent> = fan_out(requests(vec!["slow", "fast"]), |r| async move {
            if r.variant.as_deref() == Some("slow") {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            succeed(r)
        })
        .collect()
        .await;

        let settled: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                VariantEvent::Settled { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(settled, vec![1, 0]);
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_siblings() {
        let results = fan_out_all(requests(vec!["A", "bad", "C"]), |r| async move {
            if r.variant.as_deref() == Some("bad") {
                return GenerationResult {
                    variant: r.variant,
                    kind: r.kind,
                    outcome: Outcome::Failure {
                        message: "upstream down".to_string(),
                    },
                };
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            succeed(r)
        })
        .await;

        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].variant.as_deref(), Some("bad"));
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_failure() {
        let results = fan_out_all(requests(vec!["A", "boom"]), |r| async move {
            if r.variant.as_deref() == Some("boom") {
                panic!("task exploded");
            }
            succeed(r)
        })
        .await;

        assert_eq!(results.len(), 2);
        let boom = results
            .iter()
            .find(|r| r.variant.as_deref() == Some("boom"))
            .expect("Panicked variant must still settle");
        assert!(!boom.is_success());
        assert!(results
            .iter()
            .any(|r| r.variant.as_deref() == Some("A") && r.is_success()));
    }

    #[tokio::test]
    async fn test_tasks_run_concurrently() {
        let started = std::time::Instant::now();
        let results = fan_out_all(requests(vec!["A", "B", "C"]), |r| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            succeed(r)
        })
        .await;

        assert_eq!(results.len(), 3);
        assert!(
            started.elapsed() < Duration::from_millis(550),
            "Variants ran sequentially: {:?}",
            started.elapsed()
        );
    }
}
