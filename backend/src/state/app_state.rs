// Application state
// Built once at startup and shared read-only between request handlers

use crate::config::Config;
use crate::orchestrator::api_client::AzureClient;
use crate::orchestrator::backends::GenerationBackend;
use crate::orchestrator::poller::JobPoller;
use crate::orchestrator::tasks::TaskContext;
use crate::services::artifacts::ArtifactStore;
use crate::services::templates::TemplateCatalog;
use anyhow::Context;
use std::sync::Arc;

/// Handle shared with every handler
pub type SharedState = Arc<AppState>;

/// Application state
///
/// Nothing in here is reassigned after startup; the artifact store guards
/// its own mutable bookkeeping.
pub struct AppState {
    /// Immutable configuration
    pub config: Config,
    /// Upstream generative backend
    pub backend: Arc<dyn GenerationBackend>,
    /// Shared artifact directory
    pub store: ArtifactStore,
    /// Template catalog
    pub templates: TemplateCatalog,
    /// Video job poller
    pub poller: JobPoller,
}

impl AppState {
    /// Assemble state from already-built parts
    pub fn new(
        config: Config,
        backend: Arc<dyn GenerationBackend>,
        store: ArtifactStore,
        templates: TemplateCatalog,
    ) -> Self {
        let poller = JobPoller::new(&config.poller);
        Self {
            config,
            backend,
            store,
            templates,
            poller,
        }
    }

    /// Replace the poller built from configuration
    pub fn with_poller(mut self, poller: JobPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Build production state: Azure client, artifact directory, catalog
    ///
    /// A missing or unreadable catalog leaves the catalog empty rather than
    /// failing startup.
    pub async fn initialize(config: Config) -> anyhow::Result<Self> {
        let backend = AzureClient::new(config.upstream.clone())
            .context("Failed to build upstream HTTP client")?;

        let store = ArtifactStore::open(&config.storage.artifact_dir)
            .await
            .context("Failed to open artifact directory")?;
        if config.storage.clear_on_start {
            let removed = store
                .clear()
                .await
                .context("Failed to clear artifact directory")?;
            tracing::info!(removed = removed, "Cleared leftover artifacts");
        }

        let templates = match TemplateCatalog::load(&config.storage.template_path) {
            Ok(catalog) => {
                tracing::info!(
                    count = catalog.variants().len(),
                    path = %config.storage.template_path.display(),
                    "Loaded template catalog"
                );
                catalog
            }
            Err(e) => {
                tracing::warn!("Failed to load template catalog: {}", e);
                TemplateCatalog::default()
            }
        };

        Ok(Self::new(config, Arc::new(backend), store, templates))
    }

    /// Borrow everything a generation task needs
    pub fn task_context(&self) -> TaskContext<'_, dyn GenerationBackend> {
        TaskContext {
            backend: self.backend.as_ref(),
            store: &self.store,
            poller: &self.poller,
        }
    }
}
