//! Integration configuration.
//!
//! Persisted as a single JSON blob. Every field has a serde default, so
//! blobs written by older builds keep loading.

use chrono::{DateTime, Utc};
use dsync_store::{get_json, set_json, KvStore, Keys};
use serde::{Deserialize, Serialize};

use crate::binding::Binding;
use crate::error::{DsyncError, DsyncResult};
use crate::tokens::WCAG_AA_NORMAL;

/// Format version written into config exports.
pub const CONFIG_EXPORT_VERSION: &str = "1.0";

/// Default number of sync results kept in history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Behaviour switches for sync and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationConfig {
    /// Stamp binding versions to match their DS component during a pipeline run.
    pub auto_migration: bool,
    /// Warn about builder nodes with no binding.
    #[serde(rename = "blockNonDSStyles", alias = "blockNonDsStyles")]
    pub block_non_ds_styles: bool,
    pub contrast_threshold: f64,
    pub history_limit: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            auto_migration: true,
            block_non_ds_styles: false,
            contrast_threshold: WCAG_AA_NORMAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl IntegrationConfig {
    pub fn validate(&self) -> DsyncResult<()> {
        if !(1.0..=21.0).contains(&self.contrast_threshold) {
            return Err(DsyncError::validation(format!(
                "contrastThreshold must be between 1 and 21, got {}",
                self.contrast_threshold
            )));
        }
        if self.history_limit == 0 {
            return Err(DsyncError::validation("historyLimit must be at least 1"));
        }
        Ok(())
    }
}

pub async fn load_config(store: &dyn KvStore, keys: &Keys) -> DsyncResult<IntegrationConfig> {
    Ok(get_json(store, &keys.integration_config()).await?.unwrap_or_default())
}

pub async fn save_config(store: &dyn KvStore, keys: &Keys, config: &IntegrationConfig) -> DsyncResult<()> {
    config.validate()?;
    let key = keys.integration_config();
    set_json(store, &key, config)
        .await
        .map_err(|e| DsyncError::StorageWrite { key, message: e.to_string() })
}

/// Portable bundle of integration config and bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigExport {
    pub config: IntegrationConfig,
    pub bindings: Vec<Binding>,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl ConfigExport {
    pub fn new(config: IntegrationConfig, bindings: Vec<Binding>) -> Self {
        Self {
            config,
            bindings,
            version: CONFIG_EXPORT_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Parse and check an export. Nothing is applied here.
    pub fn parse(json: &str) -> DsyncResult<Self> {
        let export: Self = serde_json::from_str(json).map_err(|e| DsyncError::import(e.to_string()))?;
        if export.version != CONFIG_EXPORT_VERSION {
            return Err(DsyncError::import(format!(
                "unsupported config export version '{}'",
                export.version
            )));
        }
        export.config.validate().map_err(|e| DsyncError::import(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        for binding in &export.bindings {
            if binding.cms_component_type.is_empty() || binding.ds_component_id.is_empty() {
                return Err(DsyncError::import("binding with empty component type or id"));
            }
            if !seen.insert(binding.cms_component_type.as_str()) {
                return Err(DsyncError::import(format!(
                    "duplicate binding for '{}'",
                    binding.cms_component_type
                )));
            }
        }
        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsync_store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: IntegrationConfig = serde_json::from_value(json!({ "blockNonDSStyles": true })).unwrap();
        assert!(config.block_non_ds_styles);
        assert!(config.auto_migration);
        assert_eq!(config.contrast_threshold, 4.5);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[tokio::test]
    async fn test_load_save() {
        let store = MemoryStore::new();
        let keys = Keys::default();
        assert_eq!(load_config(&store, &keys).await.unwrap(), IntegrationConfig::default());

        let config = IntegrationConfig {
            history_limit: 5,
            ..Default::default()
        };
        save_config(&store, &keys, &config).await.unwrap();
        assert_eq!(load_config(&store, &keys).await.unwrap().history_limit, 5);

        let bad = IntegrationConfig {
            contrast_threshold: 30.0,
            ..Default::default()
        };
        assert!(save_config(&store, &keys, &bad).await.is_err());
    }

    #[test]
    fn test_parse_export_rejects_duplicates() {
        let binding = json!({ "cmsComponentType": "hero", "dsComponentId": "button", "version": "1.0.0" });
        let raw = json!({
            "config": {},
            "bindings": [binding.clone(), binding],
            "version": "1.0",
            "timestamp": "2026-01-01T00:00:00Z"
        });
        let err = ConfigExport::parse(&raw.to_string()).unwrap_err();
        assert!(matches!(err, DsyncError::ImportFormat(_)));
    }

    #[test]
    fn test_parse_export_round_trip() {
        let export = ConfigExport::new(IntegrationConfig::default(), Vec::new());
        let json = serde_json::to_string(&export).unwrap();
        assert_eq!(ConfigExport::parse(&json).unwrap(), export);
        assert!(ConfigExport::parse("{not json").is_err());
    }
}
