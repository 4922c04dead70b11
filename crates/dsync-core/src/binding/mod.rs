//! Binding registry.
//!
//! Maps builder component types onto design system components. There is at
//! most one binding per `cmsComponentType`; saving replaces by that key.

pub mod apply;
pub mod model;

use std::sync::Arc;

use dsync_store::{get_json, set_json, KvStore, Keys};
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info};

use crate::design::model::Version;
use crate::diff::MigrationRule;
use crate::error::{DsyncError, DsyncResult};
use crate::node::ComponentNode;
use crate::tokens::TokenReference;

pub use apply::{apply_tokens_to_node, apply_tokens_to_tree};
pub use model::{Binding, TokenBinding, TokenTransform};

/// Persisted list of bindings, keyed by builder component type.
pub struct BindingRegistry {
    store: Arc<dyn KvStore>,
    keys: Keys,
    bindings: RwLock<Vec<Binding>>,
}

impl BindingRegistry {
    pub async fn load(store: Arc<dyn KvStore>, keys: Keys) -> DsyncResult<Self> {
        let bindings: Vec<Binding> = get_json(store.as_ref(), &keys.bindings()).await?.unwrap_or_default();
        debug!(bindings = bindings.len(), "Binding registry loaded");
        Ok(Self {
            store,
            keys,
            bindings: RwLock::new(bindings),
        })
    }

    pub async fn list(&self) -> Vec<Binding> {
        self.bindings.read().await.clone()
    }

    pub async fn get(&self, cms_component_type: &str) -> Option<Binding> {
        self.bindings
            .read()
            .await
            .iter()
            .find(|b| b.cms_component_type == cms_component_type)
            .cloned()
    }

    /// Insert `binding`, replacing any binding for the same component type.
    pub async fn save(&self, binding: Binding) -> DsyncResult<()> {
        let mut bindings = self.bindings.write().await;
        let mut candidate = bindings.clone();
        let ty = binding.cms_component_type.clone();
        match candidate.iter_mut().find(|b| b.cms_component_type == ty) {
            Some(existing) => *existing = binding,
            None => candidate.push(binding),
        }
        self.persist(&candidate).await?;
        *bindings = candidate;
        info!(cms_type = %ty, "Saved binding");
        Ok(())
    }

    /// Remove the binding for `cms_component_type`. Returns whether one existed.
    pub async fn remove(&self, cms_component_type: &str) -> DsyncResult<bool> {
        let mut bindings = self.bindings.write().await;
        let before = bindings.len();
        let candidate: Vec<Binding> = bindings
            .iter()
            .filter(|b| b.cms_component_type != cms_component_type)
            .cloned()
            .collect();
        if candidate.len() == before {
            return Ok(false);
        }
        self.persist(&candidate).await?;
        *bindings = candidate;
        info!(cms_type = %cms_component_type, "Removed binding");
        Ok(true)
    }

    /// Replace every binding at once (config import).
    /// Hold the binding list for a write that spans other state as well.
    pub(crate) async fn lock_for_update(&self) -> RwLockWriteGuard<'_, Vec<Binding>> {
        self.bindings.write().await
    }

    /// Rewrite token paths according to rename rules. Same-path rules are
    /// update annotations and are skipped. Returns the number of rewritten
    /// token bindings.
    pub async fn migrate_token_paths(&self, rules: &[MigrationRule]) -> DsyncResult<usize> {
        let renames: Vec<&MigrationRule> = rules.iter().filter(|r| r.is_rename()).collect();
        if renames.is_empty() {
            return Ok(0);
        }

        let mut bindings = self.bindings.write().await;
        let mut candidate = bindings.clone();
        let mut rewritten = 0;
        for token_binding in candidate.iter_mut().flat_map(|b| b.token_bindings.iter_mut()) {
            let path = token_binding.reference().path().to_string();
            // Later rules win when a path was renamed more than once.
            if let Some(rule) = renames.iter().rev().find(|r| r.from == path) {
                let was_reference = TokenReference::parse(&token_binding.token_path).is_some();
                token_binding.token_path = if was_reference {
                    TokenReference::new(rule.to.clone()).to_string()
                } else {
                    rule.to.clone()
                };
                rewritten += 1;
            }
        }

        if rewritten > 0 {
            self.persist(&candidate).await?;
            *bindings = candidate;
            info!(rewritten, "Migrated binding token paths");
        }
        Ok(rewritten)
    }

    /// Set the recorded DS component version on a binding.
    pub async fn stamp_version(&self, cms_component_type: &str, version: &str) -> DsyncResult<()> {
        let mut bindings = self.bindings.write().await;
        let mut candidate = bindings.clone();
        let binding = candidate
            .iter_mut()
            .find(|b| b.cms_component_type == cms_component_type)
            .ok_or_else(|| DsyncError::validation(format!("no binding for '{}'", cms_component_type)))?;
        if binding.version == version {
            return Ok(());
        }
        binding.version = version.to_string();
        self.persist(&candidate).await?;
        *bindings = candidate;
        debug!(cms_type = %cms_component_type, version, "Stamped binding version");
        Ok(())
    }

    /// Apply tokens from `version` to every bound node in `tree`.
    pub async fn apply_tokens(&self, tree: &mut ComponentNode, version: Option<&Version>) -> usize {
        let bindings = self.bindings.read().await;
        apply_tokens_to_tree(
            tree,
            &|ty| bindings.iter().find(|b| b.cms_component_type == ty),
            version,
        )
    }

    pub(crate) async fn persist(&self, bindings: &[Binding]) -> DsyncResult<()> {
        let key = self.keys.bindings();
        set_json(self.store.as_ref(), &key, bindings)
            .await
            .map_err(|e| DsyncError::StorageWrite { key, message: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsync_store::MemoryStore;

    fn binding(ty: &str, ds: &str, paths: &[&str]) -> Binding {
        Binding {
            cms_component_type: ty.to_string(),
            ds_component_id: ds.to_string(),
            variant_mapping: Default::default(),
            prop_mapping: Default::default(),
            token_bindings: paths
                .iter()
                .map(|p| TokenBinding {
                    cms_prop: "p".to_string(),
                    token_path: p.to_string(),
                    css_property: Some("color".to_string()),
                    transform: None,
                })
                .collect(),
            enabled: true,
            version: "1.0.0".to_string(),
        }
    }

    async fn registry() -> (Arc<MemoryStore>, BindingRegistry) {
        let kv = Arc::new(MemoryStore::new());
        let reg = BindingRegistry::load(kv.clone(), Keys::default()).await.unwrap();
        (kv, reg)
    }

    #[tokio::test]
    async fn test_save_replaces_by_component_type() {
        let (kv, reg) = registry().await;
        reg.save(binding("hero", "button", &[])).await.unwrap();
        reg.save(binding("hero", "card", &[])).await.unwrap();

        let all = reg.list().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].ds_component_id, "card");

        let reloaded = BindingRegistry::load(kv, Keys::default()).await.unwrap();
        assert_eq!(reloaded.get("hero").await.unwrap().ds_component_id, "card");
    }

    #[tokio::test]
    async fn test_remove() {
        let (_kv, reg) = registry().await;
        reg.save(binding("hero", "button", &[])).await.unwrap();
        assert!(reg.remove("hero").await.unwrap());
        assert!(!reg.remove("hero").await.unwrap());
        assert!(reg.get("hero").await.is_none());
    }

    #[tokio::test]
    async fn test_migrate_token_paths_keeps_reference_form() {
        let (_kv, reg) = registry().await;
        reg.save(binding("hero", "button", &["{color.old}", "color.old", "color.keep"]))
            .await
            .unwrap();

        let rules = vec![
            MigrationRule {
                from: "color.keep".to_string(),
                to: "color.keep".to_string(),
                automatic: true,
                notes: "#000→#111".to_string(),
            },
            MigrationRule {
                from: "color.old".to_string(),
                to: "color.new".to_string(),
                automatic: true,
                notes: String::new(),
            },
        ];
        assert_eq!(reg.migrate_token_paths(&rules).await.unwrap(), 2);

        let paths: Vec<String> = reg.get("hero").await.unwrap().token_bindings.into_iter().map(|t| t.token_path).collect();
        assert_eq!(paths, vec!["{color.new}", "color.new", "color.keep"]);
    }

    #[tokio::test]
    async fn test_stamp_version() {
        let (_kv, reg) = registry().await;
        reg.save(binding("hero", "button", &[])).await.unwrap();
        reg.stamp_version("hero", "2.0.0").await.unwrap();
        assert_eq!(reg.get("hero").await.unwrap().version, "2.0.0");
        assert!(reg.stamp_version("missing", "2.0.0").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_bindings_untouched() {
        let kv = Arc::new(MemoryStore::with_capacity(8));
        let reg = BindingRegistry::load(kv, Keys::default()).await.unwrap();
        let err = reg.save(binding("hero", "button", &[])).await.unwrap_err();
        assert!(matches!(err, DsyncError::StorageWrite { .. }));
        assert!(reg.list().await.is_empty());
    }
}
