//! Sync source and result types.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::Impact;
use crate::error::{DsyncError, DsyncResult};

/// Longest accepted auto-sync period (one year).
pub const MAX_SYNC_INTERVAL_MINUTES: u64 = 525_600;

/// Where a source's tokens come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    #[serde(rename_all = "camelCase")]
    Figma {
        file_key: String,
        access_token: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        node_ids: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Github {
        owner: String,
        repo: String,
        #[serde(default = "default_branch")]
        branch: String,
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Url {
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

fn default_branch() -> String {
    "main".to_string()
}

impl SourceConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Figma { .. } => "figma",
            Self::Github { .. } => "github",
            Self::Url { .. } => "url",
        }
    }

    /// One-line description without credentials.
    pub fn summary(&self) -> String {
        match self {
            Self::Figma { file_key, node_ids, .. } if node_ids.is_empty() => format!("figma file {}", file_key),
            Self::Figma { file_key, node_ids, .. } => format!("figma file {} ({} nodes)", file_key, node_ids.len()),
            Self::Github { owner, repo, branch, path, .. } => format!("github {}/{}@{}:{}", owner, repo, branch, path),
            Self::Url { url, .. } => url.clone(),
        }
    }
}

/// A registered token source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSource {
    pub id: String,
    pub name: String,
    pub config: SourceConfig,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_sync: bool,
    /// Minutes between automatic syncs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_interval: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl SyncSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, config: SourceConfig) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            config,
            enabled: true,
            last_sync: None,
            auto_sync: false,
            sync_interval: None,
        }
    }

    /// Period for the auto-sync timer, if this source should have one.
    /// Out-of-range intervals never get a timer.
    pub fn auto_sync_interval(&self) -> Option<Duration> {
        match (self.enabled, self.auto_sync, self.sync_interval) {
            (true, true, Some(minutes)) if (1..=MAX_SYNC_INTERVAL_MINUTES).contains(&minutes) => {
                minutes.checked_mul(60).map(Duration::from_secs)
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> DsyncResult<()> {
        if self.name.trim().is_empty() {
            return Err(DsyncError::validation("source name cannot be empty"));
        }
        if let Some(minutes) = self.sync_interval {
            if minutes > MAX_SYNC_INTERVAL_MINUTES {
                return Err(DsyncError::validation(format!(
                    "sync interval {} exceeds the maximum of {} minutes",
                    minutes, MAX_SYNC_INTERVAL_MINUTES
                )));
            }
        }
        Ok(())
    }
}

/// One entry of the sync history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    /// Source id.
    pub source: String,
    pub changes: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
}

impl SyncResult {
    pub fn failed(source: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            timestamp: Utc::now(),
            source: source.to_string(),
            changes: 0,
            errors: vec![error.into()],
            warnings: Vec::new(),
            new_version: None,
            impact: None,
        }
    }

    pub fn succeeded(source: &str) -> Self {
        Self {
            success: true,
            timestamp: Utc::now(),
            source: source.to_string(),
            changes: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            new_version: None,
            impact: None,
        }
    }
}

/// States a single sync moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Idle,
    Fetching,
    Diffing,
    Versioning,
    Persisting,
    Completed,
    Failed,
}
