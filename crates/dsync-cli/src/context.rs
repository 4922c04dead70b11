//! Wiring the orchestrator from CLI settings.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dsync_core::sync::HttpSourceAdapter;
use dsync_core::SyncOrchestrator;
use dsync_store::{init_store, KvStore, Keys, MemoryStore};
use tracing::debug;

use crate::settings::{Backend, Settings};

/// Connect to the configured store and load the orchestrator.
pub async fn open(project_dir: &Path) -> Result<Arc<SyncOrchestrator>> {
    let settings = Settings::load(project_dir)?;
    let store: Arc<dyn KvStore> = match settings.backend {
        Backend::Redis => Arc::new(
            init_store(&settings.redis_url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", settings.redis_url))?,
        ),
        Backend::Memory => Arc::new(MemoryStore::new()),
    };
    debug!(backend = ?settings.backend, namespace = %settings.namespace, "Opening store");

    SyncOrchestrator::load(store, Keys::new(settings.namespace), Arc::new(HttpSourceAdapter::new()?))
        .await
        .context("Failed to load design system state")
}
