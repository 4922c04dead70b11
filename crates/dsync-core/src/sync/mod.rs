//! Sync orchestrator.
//!
//! [`SyncOrchestrator`] is the top-level handle: it owns the token store,
//! the binding registry, the registered sources, the sync history and the
//! auto-sync timers. A sync runs to completion or failure:
//! `idle → fetching → diffing → versioning → persisting → completed|failed`.
//! A failed sync never creates a version.

pub mod adapter;
pub mod figma;
pub mod github;
pub mod model;
pub mod pipeline;
pub mod scheduler;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use dsync_store::{get_json, set_json, KvStore, Keys};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::binding::{Binding, BindingRegistry};
use crate::config::{load_config, save_config, ConfigExport, IntegrationConfig};
use crate::design::TokenStore;
use crate::error::{DsyncError, DsyncResult};
use crate::node::ComponentNode;
use crate::tokens::TokenSet;
use crate::validation::{ValidationEngine, ValidationResult};

pub use adapter::{HttpSourceAdapter, SourceAdapter};
pub use model::{SourceConfig, SyncPhase, SyncResult, SyncSource};
pub use pipeline::{PipelineReport, PipelineStage, StageName, StageStatus};
pub use scheduler::{AutoSyncHandle, AutoSyncScheduler};

/// Error reported when a second sync of the same source is attempted.
pub const SYNC_IN_PROGRESS: &str = "sync already in progress";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks a source as syncing for as long as it lives.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    source_id: String,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, source_id: &str) -> Option<Self> {
        lock(set).insert(source_id.to_string()).then(|| Self {
            set,
            source_id: source_id.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.source_id);
    }
}

pub struct SyncOrchestrator {
    store: Arc<dyn KvStore>,
    keys: Keys,
    tokens: TokenStore,
    bindings: BindingRegistry,
    adapter: Arc<dyn SourceAdapter>,
    sources: RwLock<Vec<SyncSource>>,
    history: RwLock<Vec<SyncResult>>,
    config: RwLock<IntegrationConfig>,
    applied_css: RwLock<Option<String>>,
    in_flight: Mutex<HashSet<String>>,
    phases: Mutex<HashMap<String, SyncPhase>>,
    scheduler: AutoSyncScheduler,
}

impl SyncOrchestrator {
    /// Load every document from `store`. Auto-sync timers are not started;
    /// see [`SyncOrchestrator::start_auto_sync`].
    pub async fn load(store: Arc<dyn KvStore>, keys: Keys, adapter: Arc<dyn SourceAdapter>) -> DsyncResult<Arc<Self>> {
        let tokens = TokenStore::load(store.clone(), keys.clone()).await?;
        let bindings = BindingRegistry::load(store.clone(), keys.clone()).await?;
        let config = load_config(store.as_ref(), &keys).await?;
        let sources: Vec<SyncSource> = get_json(store.as_ref(), &keys.sync_sources()).await?.unwrap_or_default();
        let mut history: Vec<SyncResult> = get_json(store.as_ref(), &keys.sync_history()).await?.unwrap_or_default();
        trim_history(&mut history, config.history_limit);

        info!(namespace = keys.namespace(), sources = sources.len(), "Sync orchestrator loaded");
        Ok(Arc::new_cyclic(|weak| Self {
            store,
            keys,
            tokens,
            bindings,
            adapter,
            sources: RwLock::new(sources),
            history: RwLock::new(history),
            config: RwLock::new(config),
            applied_css: RwLock::new(None),
            in_flight: Mutex::new(HashSet::new()),
            phases: Mutex::new(HashMap::new()),
            scheduler: AutoSyncScheduler::new(weak.clone()),
        }))
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    pub fn scheduler(&self) -> &AutoSyncScheduler {
        &self.scheduler
    }

    // --- Sources ---

    pub async fn list_sources(&self) -> Vec<SyncSource> {
        self.sources.read().await.clone()
    }

    pub async fn source(&self, id: &str) -> Option<SyncSource> {
        self.sources.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Register a source. An empty id gets a generated one.
    pub async fn add_source(&self, mut source: SyncSource) -> DsyncResult<SyncSource> {
        if source.id.trim().is_empty() {
            source.id = Uuid::new_v4().to_string();
        }
        source.validate()?;

        let mut sources = self.sources.write().await;
        if sources.iter().any(|s| s.id == source.id) {
            return Err(DsyncError::SourceExists(source.id));
        }
        let mut candidate = sources.clone();
        candidate.push(source.clone());
        self.persist_sources(&candidate).await?;
        *sources = candidate;
        drop(sources);

        info!(source_id = %source.id, kind = source.config.type_name(), "Added sync source");
        self.scheduler.schedule(&source);
        Ok(source)
    }

    /// Replace a source in place, rescheduling its timer.
    pub async fn update_source(&self, source: SyncSource) -> DsyncResult<()> {
        source.validate()?;
        let mut sources = self.sources.write().await;
        let mut candidate = sources.clone();
        let slot = candidate
            .iter_mut()
            .find(|s| s.id == source.id)
            .ok_or_else(|| DsyncError::SourceNotFound(source.id.clone()))?;
        *slot = source.clone();
        self.persist_sources(&candidate).await?;
        *sources = candidate;
        drop(sources);

        self.scheduler.schedule(&source);
        Ok(())
    }

    pub async fn set_source_enabled(&self, id: &str, enabled: bool) -> DsyncResult<()> {
        let mut source = self
            .source(id)
            .await
            .ok_or_else(|| DsyncError::SourceNotFound(id.to_string()))?;
        source.enabled = enabled;
        self.update_source(source).await?;
        info!(source_id = %id, enabled, "Sync source toggled");
        Ok(())
    }

    /// Delete a source and cancel its auto-sync timer.
    pub async fn remove_source(&self, id: &str) -> DsyncResult<SyncSource> {
        let mut sources = self.sources.write().await;
        let position = sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| DsyncError::SourceNotFound(id.to_string()))?;
        let mut candidate = sources.clone();
        let removed = candidate.remove(position);
        self.persist_sources(&candidate).await?;
        *sources = candidate;
        drop(sources);

        self.scheduler.cancel(id);
        lock(&self.phases).remove(id);
        info!(source_id = %id, "Removed sync source");
        Ok(removed)
    }

    /// Start timers for every source with auto-sync enabled. Returns how
    /// many were scheduled.
    pub async fn start_auto_sync(&self) -> usize {
        let sources = self.list_sources().await;
        sources.iter().filter(|s| self.scheduler.schedule(s)).count()
    }

    async fn persist_sources(&self, sources: &[SyncSource]) -> DsyncResult<()> {
        let key = self.keys.sync_sources();
        set_json(self.store.as_ref(), &key, sources)
            .await
            .map_err(|e| DsyncError::StorageWrite { key, message: e.to_string() })
    }

    // --- Sync ---

    /// Where the latest sync of `source_id` stands.
    pub fn phase(&self, source_id: &str) -> SyncPhase {
        lock(&self.phases).get(source_id).copied().unwrap_or(SyncPhase::Idle)
    }

    fn enter(&self, source_id: &str, phase: SyncPhase) {
        debug!(source_id = %source_id, ?phase, "Sync phase");
        lock(&self.phases).insert(source_id.to_string(), phase);
    }

    /// Fetch, diff, version and persist tokens from one source.
    ///
    /// Failures come back as a `success: false` result and leave the
    /// active token set untouched. A concurrent sync of the same source is
    /// rejected without being recorded.
    pub async fn sync(&self, source_id: &str) -> SyncResult {
        let Some(_guard) = InFlight::acquire(&self.in_flight, source_id) else {
            warn!(source_id = %source_id, "Sync already in progress");
            return SyncResult::failed(source_id, SYNC_IN_PROGRESS);
        };

        info!(source_id = %source_id, "Sync started");
        let mut result = match self.run_sync(source_id).await {
            Ok(result) => {
                self.enter(source_id, SyncPhase::Completed);
                info!(
                    source_id = %source_id,
                    changes = result.changes,
                    version = ?result.new_version,
                    "Sync completed"
                );
                result
            }
            Err(e) => {
                self.enter(source_id, SyncPhase::Failed);
                warn!(source_id = %source_id, error = %e, "Sync failed");
                SyncResult::failed(source_id, e.to_string())
            }
        };

        if let Err(e) = self.record(&result).await {
            warn!(source_id = %source_id, error = %e, "Failed to persist sync history");
            result.warnings.push(format!("sync history not saved: {}", e));
        }
        result
    }

    async fn run_sync(&self, source_id: &str) -> DsyncResult<SyncResult> {
        let source = self
            .source(source_id)
            .await
            .ok_or_else(|| DsyncError::SourceNotFound(source_id.to_string()))?;
        if !source.enabled {
            return Err(DsyncError::validation(format!("source '{}' is disabled", source_id)));
        }

        self.enter(source_id, SyncPhase::Fetching);
        let payload = self.adapter.fetch(&source.config).await?;
        let incoming: TokenSet = serde_json::from_value(payload).map_err(|e| {
            DsyncError::fetch(source.config.type_name(), format!("payload is not a token set: {}", e))
        })?;
        if incoming.is_empty() {
            return Err(DsyncError::fetch(source.config.type_name(), "payload contains no tokens"));
        }
        incoming
            .check_names()
            .map_err(|e| DsyncError::fetch(source.config.type_name(), e.to_string()))?;

        let mut result = SyncResult::succeeded(source_id);

        self.enter(source_id, SyncPhase::Diffing);
        let tx = self.tokens.begin().await;
        let diff = tx.diff(&incoming);
        result.changes = diff.total_changes();
        result.impact = Some(diff.impact);

        if diff.is_empty() && tx.current().is_some() {
            drop(tx);
            debug!(source_id = %source_id, "Source matches current tokens");
        } else {
            self.enter(source_id, SyncPhase::Versioning);
            let version = tx.build_version(incoming, &diff, &source.name)?;

            self.enter(source_id, SyncPhase::Persisting);
            let version = tx.commit(version).await?;
            result.new_version = Some(version.version);

            if let Err(e) = self.tokens.add_migration_rules(&diff.migrations).await {
                warn!(error = %e, "Failed to record migration rules");
                result.warnings.push(format!("migration rules not recorded: {}", e));
            }
        }

        if let Err(e) = self.touch_last_sync(source_id).await {
            warn!(source_id = %source_id, error = %e, "Failed to update lastSync");
            result.warnings.push(format!("lastSync not saved: {}", e));
        }
        Ok(result)
    }

    async fn touch_last_sync(&self, source_id: &str) -> DsyncResult<()> {
        let mut sources = self.sources.write().await;
        let mut candidate = sources.clone();
        if let Some(source) = candidate.iter_mut().find(|s| s.id == source_id) {
            source.last_sync = Some(Utc::now());
        }
        self.persist_sources(&candidate).await?;
        *sources = candidate;
        Ok(())
    }

    /// Append to history, dropping the oldest entries past the limit.
    async fn record(&self, result: &SyncResult) -> DsyncResult<()> {
        let limit = self.config.read().await.history_limit;
        let mut history = self.history.write().await;
        let mut candidate = history.clone();
        candidate.push(result.clone());
        trim_history(&mut candidate, limit);
        self.persist_history(&candidate).await?;
        *history = candidate;
        Ok(())
    }

    async fn persist_history(&self, history: &[SyncResult]) -> DsyncResult<()> {
        let key = self.keys.sync_history();
        set_json(self.store.as_ref(), &key, history)
            .await
            .map_err(|e| DsyncError::StorageWrite { key, message: e.to_string() })
    }

    /// Recorded sync results, oldest first.
    pub async fn sync_history(&self) -> Vec<SyncResult> {
        self.history.read().await.clone()
    }

    /// Run all five pipeline stages for `source_id`.
    pub async fn execute_sync_pipeline(&self, source_id: &str) -> PipelineReport {
        self.execute_sync_pipeline_with(source_id, |_| {}).await
    }

    /// Like [`Self::execute_sync_pipeline`], reporting every stage transition
    /// to `on_stage`.
    ///
    /// Stops at the first failed stage, leaving later stages pending.
    /// A version committed by the tokens stage is kept.
    pub async fn execute_sync_pipeline_with(
        &self,
        source_id: &str,
        mut on_stage: impl FnMut(&PipelineStage) + Send,
    ) -> PipelineReport {
        let mut report = PipelineReport::new(source_id);

        for name in StageName::ALL {
            let stage = report.stage_mut(name);
            stage.start();
            on_stage(stage);
            debug!(source_id = %source_id, stage = name.as_str(), "Pipeline stage started");

            let outcome = match name {
                StageName::Tokens => {
                    let result = self.sync(source_id).await;
                    let errors = result.errors.clone();
                    let success = result.success;
                    report.sync = Some(result);
                    if success {
                        Ok(())
                    } else {
                        Err(errors)
                    }
                }
                StageName::Themes => {
                    self.apply_theme().await;
                    Ok(())
                }
                StageName::Components => self.migrate_bindings().await,
                // Extension points: nothing to do yet.
                StageName::Layouts | StageName::Content => Ok(()),
            };

            let stage = report.stage_mut(name);
            match outcome {
                Ok(()) => stage.complete(),
                Err(errors) => stage.fail(errors),
            }
            on_stage(stage);

            if stage.status == StageStatus::Failed {
                warn!(source_id = %source_id, stage = name.as_str(), "Pipeline stopped");
                return report;
            }
        }

        info!(source_id = %source_id, "Pipeline completed");
        report
    }

    /// Regenerate the CSS custom properties for the current token set.
    async fn apply_theme(&self) {
        let css = self.tokens.css().await;
        *self.applied_css.write().await = css;
    }

    /// CSS produced by the last themes stage, if any.
    pub async fn applied_css(&self) -> Option<String> {
        self.applied_css.read().await.clone()
    }

    /// Stamp binding versions to match their DS component.
    async fn migrate_bindings(&self) -> Result<(), Vec<String>> {
        if !self.config.read().await.auto_migration {
            return Ok(());
        }

        let mut errors = Vec::new();
        for binding in self.bindings.list().await.into_iter().filter(|b| b.enabled) {
            let Some(component) = self.tokens.component(&binding.ds_component_id).await else {
                continue;
            };
            if component.version == binding.version {
                continue;
            }
            match self.bindings.stamp_version(&binding.cms_component_type, &component.version).await {
                Ok(()) => info!(
                    cms_type = %binding.cms_component_type,
                    from = %binding.version,
                    to = %component.version,
                    "Binding migrated"
                ),
                Err(e) => errors.push(e.to_string()),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    // --- Config ---

    pub async fn config(&self) -> IntegrationConfig {
        self.config.read().await.clone()
    }

    pub async fn set_config(&self, new_config: IntegrationConfig) -> DsyncResult<()> {
        self.install_config(new_config, None).await
    }

    /// Serialize the integration config and bindings.
    pub async fn export_config(&self) -> DsyncResult<String> {
        let export = ConfigExport::new(self.config().await, self.bindings.list().await);
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Install an exported config and its bindings. The payload is fully
    /// checked before anything is written.
    pub async fn import_config(&self, json: &str) -> DsyncResult<ConfigExport> {
        let export = ConfigExport::parse(json)?;
        self.install_config(export.config.clone(), Some(export.bindings.clone())).await?;
        info!(bindings = export.bindings.len(), "Imported integration config");
        Ok(export)
    }

    /// Write a config, the history it trims and optionally a new binding
    /// list. Either every write lands or the stored blobs are put back and
    /// memory is left untouched.
    async fn install_config(&self, new_config: IntegrationConfig, new_bindings: Option<Vec<Binding>>) -> DsyncResult<()> {
        new_config.validate()?;
        let mut config = self.config.write().await;
        let mut history = self.history.write().await;
        let mut bindings = self.bindings.lock_for_update().await;

        let mut trimmed = history.clone();
        trim_history(&mut trimmed, new_config.history_limit);
        let history_changed = trimmed.len() != history.len();

        if let Some(new_bindings) = &new_bindings {
            self.bindings.persist(new_bindings).await?;
        }
        if history_changed {
            if let Err(e) = self.persist_history(&trimmed).await {
                if new_bindings.is_some() {
                    self.restore_bindings(&bindings).await;
                }
                return Err(e);
            }
        }
        if let Err(e) = save_config(self.store.as_ref(), &self.keys, &new_config).await {
            if new_bindings.is_some() {
                self.restore_bindings(&bindings).await;
            }
            if history_changed {
                if let Err(restore) = self.persist_history(&history).await {
                    warn!(error = %restore, "Failed to restore sync history");
                }
            }
            return Err(e);
        }

        *config = new_config;
        *history = trimmed;
        if let Some(new_bindings) = new_bindings {
            *bindings = new_bindings;
        }
        Ok(())
    }

    async fn restore_bindings(&self, previous: &[Binding]) {
        if let Err(e) = self.bindings.persist(previous).await {
            warn!(error = %e, "Failed to restore bindings");
        }
    }

    // --- Trees ---

    /// Apply current tokens to every bound node of `tree`.
    pub async fn apply_tokens(&self, tree: &mut ComponentNode) -> usize {
        let current = self.tokens.current().await;
        self.bindings.apply_tokens(tree, current.as_ref()).await
    }

    pub async fn validate_tree(&self, tree: &ComponentNode) -> ValidationResult {
        let current = self.tokens.current().await;
        let bindings = self.bindings.list().await;
        let config = self.config().await;
        ValidationEngine::new(current.as_ref(), &bindings, &config).validate_tree(tree)
    }

    /// Apply every auto-fix to `tree`. Returns the number of fixed nodes.
    pub async fn auto_fix(&self, tree: &mut ComponentNode) -> usize {
        let current = self.tokens.current().await;
        let bindings = self.bindings.list().await;
        let config = self.config().await;
        ValidationEngine::new(current.as_ref(), &bindings, &config).auto_fix(tree)
    }
}

/// Keep the `limit` most recent results.
fn trim_history(history: &mut Vec<SyncResult>, limit: usize) {
    if history.len() > limit {
        history.drain(..history.len() - limit);
    }
}
