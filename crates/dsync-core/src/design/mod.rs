//! Versioned token store.
//!
//! [`TokenStore`] is the handle owning the version list and the "current"
//! pointer. It replaces any notion of an ambient current version: every
//! instance is backed by its own [`KvStore`] and can be used in isolation.
//!
//! All writes go through a [`TokenTransaction`], which holds the write lock
//! from diffing to persisting, so commits from different sources are
//! serialized and never lose each other's versions. In-memory state only
//! changes after the store accepted the write.

pub mod model;

use std::sync::Arc;

use chrono::Utc;
use dsync_store::{get_json, set_json, KvStore, Keys, StoreResult};
use serde_json::Value;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::diff::{diff, Impact, MigrationRule, TokenDiff};
use crate::error::{DsyncError, DsyncResult};
use crate::tokens::{generate_css, Token, TokenSet};
use crate::versioning::{build_changelog, next_version, ChangeKind, ChangelogEntry, SemVer, INITIAL_VERSION};

use model::{DsComponent, Version};

/// Versions kept by a standard cleanup pass.
pub const STANDARD_RETAINED_VERSIONS: usize = 20;

/// Versions kept by an aggressive cleanup pass.
pub const AGGRESSIVE_RETAINED_VERSIONS: usize = 3;

/// Upper bound on stored migration rules.
const MAX_MIGRATION_RULES: usize = 500;

/// How hard a cleanup pass prunes old versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupLevel {
    Standard,
    Aggressive,
}

impl CleanupLevel {
    pub fn retained_versions(&self) -> usize {
        match self {
            Self::Standard => STANDARD_RETAINED_VERSIONS,
            Self::Aggressive => AGGRESSIVE_RETAINED_VERSIONS,
        }
    }
}

/// A committed token change.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub diff: TokenDiff,
    pub version: Version,
}

#[derive(Debug, Clone, Default)]
struct VersionState {
    versions: Vec<Version>,
    current: Option<String>,
}

impl VersionState {
    fn current(&self) -> Option<&Version> {
        let id = self.current.as_deref()?;
        self.versions.iter().rev().find(|v| v.version == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.versions.iter().any(|v| v.version == id)
    }

    /// Keep the `keep` most recent versions plus the current one.
    fn prune(&mut self, keep: usize) -> usize {
        let len = self.versions.len();
        if len <= keep {
            return 0;
        }
        let cutoff = len - keep;
        let current = self.current.clone();
        let mut index = 0;
        self.versions.retain(|v| {
            let retain = index >= cutoff || current.as_deref() == Some(v.version.as_str());
            index += 1;
            retain
        });
        len - self.versions.len()
    }
}

/// Handle owning `{versions, current}` over an injected store.
pub struct TokenStore {
    store: Arc<dyn KvStore>,
    keys: Keys,
    state: RwLock<VersionState>,
}

impl TokenStore {
    /// Load versions and the current pointer from the store.
    pub async fn load(store: Arc<dyn KvStore>, keys: Keys) -> DsyncResult<Self> {
        let versions: Vec<Version> = get_json(store.as_ref(), &keys.versions()).await?.unwrap_or_default();
        let mut current = get_json::<Option<String>>(store.as_ref(), &keys.current_version())
            .await?
            .flatten();

        if let Some(id) = current.as_deref() {
            if !versions.iter().any(|v| v.version == id) {
                warn!(version = %id, "Current version pointer is dangling, using latest version");
                current = versions.last().map(|v| v.version.clone());
            }
        }

        debug!(versions = versions.len(), current = ?current, "Token store loaded");
        Ok(Self {
            store,
            keys,
            state: RwLock::new(VersionState { versions, current }),
        })
    }

    /// Snapshot of the current version.
    pub async fn current(&self) -> Option<Version> {
        self.state.read().await.current().cloned()
    }

    pub async fn current_version_id(&self) -> Option<String> {
        self.state.read().await.current().map(|v| v.version.clone())
    }

    pub async fn current_tokens(&self) -> Option<TokenSet> {
        self.state.read().await.current().map(|v| v.tokens.clone())
    }

    /// All versions, oldest first.
    pub async fn list_versions(&self) -> Vec<Version> {
        self.state.read().await.versions.clone()
    }

    pub async fn version(&self, id: &str) -> Option<Version> {
        self.state.read().await.versions.iter().find(|v| v.version == id).cloned()
    }

    /// Point read against the current version.
    pub async fn get_token(&self, path: &str) -> Option<Token> {
        self.state.read().await.current()?.tokens.get(path).cloned()
    }

    /// CSS for the current token set.
    pub async fn css(&self) -> Option<String> {
        self.state.read().await.current().map(|v| generate_css(&v.tokens))
    }

    pub async fn component(&self, id: &str) -> Option<DsComponent> {
        self.state.read().await.current()?.component(id).cloned()
    }

    pub async fn list_components(&self) -> Vec<DsComponent> {
        self.state
            .read()
            .await
            .current()
            .map(|v| v.components.clone())
            .unwrap_or_default()
    }

    /// Start a write. Holds the write lock until dropped or committed.
    pub async fn begin(&self) -> TokenTransaction<'_> {
        TokenTransaction {
            owner: self,
            state: self.state.write().await,
        }
    }

    /// Diff `tokens` against the current set and commit a new version.
    ///
    /// Returns `None` when a current version exists and nothing changed.
    pub async fn commit_tokens(&self, tokens: TokenSet, origin: &str) -> DsyncResult<Option<CommitOutcome>> {
        let tx = self.begin().await;
        let diff = tx.diff(&tokens);
        if diff.is_empty() && tx.current().is_some() {
            debug!(origin, "No token changes, skipping version");
            return Ok(None);
        }
        let version = tx.build_version(tokens, &diff, origin)?;
        let version = tx.commit(version).await?;
        Ok(Some(CommitOutcome { diff, version }))
    }

    /// Write a single token, producing a new version.
    pub async fn set_token(&self, path: &str, value: Value) -> DsyncResult<Option<CommitOutcome>> {
        let mut tokens = self.current_tokens().await.unwrap_or_default();
        tokens.set(path, value)?;
        self.commit_tokens(tokens, "manual").await
    }

    /// Create or replace a component definition, producing a new version.
    pub async fn save_component(&self, component: DsComponent) -> DsyncResult<Version> {
        let tx = self.begin().await;
        let current = tx.current().ok_or(DsyncError::NoActiveVersion)?;

        let mut components = current.components.clone();
        let kind = match components.iter_mut().find(|c| c.id == component.id) {
            Some(existing) => {
                *existing = component.clone();
                ChangeKind::Update
            }
            None => {
                components.push(component.clone());
                ChangeKind::Add
            }
        };

        let id = tx.unique_version_id(next_version(&current.version, Impact::Low)?)?;
        let version = Version {
            version: id,
            timestamp: Utc::now(),
            tokens: current.tokens.clone(),
            components,
            changelog: vec![ChangelogEntry::new(
                kind,
                format!("component.{}", component.id),
                format!("{} component {}", if kind == ChangeKind::Add { "Added" } else { "Updated" }, component.name),
            )],
            breaking: false,
            origin: Some("manual".to_string()),
        };
        tx.commit(version).await
    }

    /// Point "current" at an existing version.
    pub async fn rollback(&self, id: &str) -> DsyncResult<()> {
        let mut state = self.state.write().await;
        if !state.contains(id) {
            return Err(DsyncError::VersionNotFound(id.to_string()));
        }
        let key = self.keys.current_version();
        set_json(self.store.as_ref(), &key, id)
            .await
            .map_err(|e| DsyncError::StorageWrite { key, message: e.to_string() })?;
        state.current = Some(id.to_string());
        info!(version = %id, "Rolled back current version");
        Ok(())
    }

    /// Serialize the current version.
    pub async fn export(&self) -> DsyncResult<String> {
        let current = self.current().await.ok_or(DsyncError::NoActiveVersion)?;
        Ok(serde_json::to_string_pretty(&current)?)
    }

    /// Install an exported version verbatim as the new current version.
    ///
    /// The payload is fully checked before anything is written.
    pub async fn import(&self, json: &str) -> DsyncResult<Version> {
        let version: Version = serde_json::from_str(json)
            .map_err(|e| DsyncError::import(format!("not a version document: {}", e)))?;
        version
            .version
            .parse::<SemVer>()
            .map_err(|_| DsyncError::import(format!("invalid version id '{}'", version.version)))?;
        version
            .tokens
            .check_names()
            .map_err(|e| DsyncError::import(e.to_string()))?;

        let tx = self.begin().await;
        if tx.state.contains(&version.version) {
            return Err(DsyncError::import(format!("version {} already exists", version.version)));
        }
        info!(version = %version.version, "Importing version");
        tx.commit(version).await
    }

    /// Prune old versions now, keeping the current one.
    pub async fn cleanup(&self, level: CleanupLevel) -> DsyncResult<usize> {
        let mut state = self.state.write().await;
        let mut candidate = state.clone();
        let removed = candidate.prune(level.retained_versions());
        if removed > 0 {
            self.write_state(&candidate)
                .await
                .map_err(|e| DsyncError::StorageWrite { key: self.keys.versions(), message: e.to_string() })?;
            *state = candidate;
        }
        Ok(removed)
    }

    /// Stored migration rules, oldest first.
    pub async fn migration_rules(&self) -> DsyncResult<Vec<MigrationRule>> {
        Ok(get_json(self.store.as_ref(), &self.keys.mappings()).await?.unwrap_or_default())
    }

    /// Append migration rules, keeping the most recent ones.
    pub async fn add_migration_rules(&self, rules: &[MigrationRule]) -> DsyncResult<()> {
        if rules.is_empty() {
            return Ok(());
        }
        let mut stored = self.migration_rules().await?;
        stored.extend_from_slice(rules);
        if stored.len() > MAX_MIGRATION_RULES {
            stored.drain(..stored.len() - MAX_MIGRATION_RULES);
        }
        let key = self.keys.mappings();
        set_json(self.store.as_ref(), &key, &stored)
            .await
            .map_err(|e| DsyncError::StorageWrite { key, message: e.to_string() })
    }

    async fn write_state(&self, state: &VersionState) -> StoreResult<()> {
        set_json(self.store.as_ref(), &self.keys.versions(), &state.versions).await?;
        set_json(self.store.as_ref(), &self.keys.current_version(), &state.current).await
    }

    /// Write `candidate`, escalating cleanup on capacity errors.
    ///
    /// Bounded: plain write, then one standard cleanup, then one aggressive
    /// cleanup. Returns the state that was actually written.
    async fn persist(&self, mut candidate: VersionState) -> DsyncResult<VersionState> {
        let key = self.keys.versions();
        let attempts = [None, Some(CleanupLevel::Standard), Some(CleanupLevel::Aggressive)];

        for level in attempts {
            if let Some(level) = level {
                let removed = candidate.prune(level.retained_versions());
                warn!(?level, removed, "Store is full, pruning old versions before retry");
            }
            match self.write_state(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.is_capacity() => continue,
                Err(e) => return Err(DsyncError::StorageWrite { key, message: e.to_string() }),
            }
        }

        Err(DsyncError::StorageWrite {
            key,
            message: "store capacity exceeded after aggressive cleanup".to_string(),
        })
    }
}

/// An in-progress write against a [`TokenStore`].
pub struct TokenTransaction<'a> {
    owner: &'a TokenStore,
    state: RwLockWriteGuard<'a, VersionState>,
}

impl TokenTransaction<'_> {
    pub fn current(&self) -> Option<&Version> {
        self.state.current()
    }

    /// Diff `tokens` against the current set.
    pub fn diff(&self, tokens: &TokenSet) -> TokenDiff {
        diff(self.current().map(|v| &v.tokens), tokens)
    }

    /// Build the next version for `tokens` without writing it.
    pub fn build_version(&self, tokens: TokenSet, diff: &TokenDiff, origin: &str) -> DsyncResult<Version> {
        let (id, components) = match self.current() {
            Some(current) => (
                next_version(&current.version, diff.impact)?,
                current.components.clone(),
            ),
            None => (INITIAL_VERSION.to_string(), Vec::new()),
        };

        Ok(Version {
            version: self.unique_version_id(id)?,
            timestamp: Utc::now(),
            tokens,
            components,
            changelog: build_changelog(diff),
            breaking: diff.impact == Impact::Breaking,
            origin: Some(origin.to_string()),
        })
    }

    /// After a rollback the bumped id may already exist; keep bumping the
    /// patch number until it is free.
    fn unique_version_id(&self, id: String) -> DsyncResult<String> {
        let mut id = id;
        while self.state.contains(&id) {
            id = match id.parse::<SemVer>() {
                Ok(v) => v.bump(Impact::Low)?.to_string(),
                Err(_) => format!("{}-{}", id, self.state.versions.len()),
            };
        }
        Ok(id)
    }

    /// Append `version`, make it current and persist.
    pub async fn commit(mut self, version: Version) -> DsyncResult<Version> {
        let mut candidate = self.state.clone();
        candidate.versions.push(version.clone());
        candidate.current = Some(version.version.clone());

        let written = self.owner.persist(candidate).await?;
        *self.state = written;
        info!(version = %version.version, breaking = version.breaking, "Committed token version");
        Ok(version)
    }
}
