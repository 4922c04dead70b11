//! CLI settings.
//!
//! Looked up in `<project>/.dsync/config.toml`, then
//! `~/.config/dsync/config.toml`. `REDIS_URL` and `DSYNC_NAMESPACE`
//! override whatever the file says.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dsync_store::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Redis,
    /// Process-local store. Nothing survives the command.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    pub redis_url: String,
    pub namespace: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl Settings {
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut settings = match Self::candidates(project_dir).into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn candidates(project_dir: &Path) -> Vec<PathBuf> {
        let mut paths = vec![project_dir.join(".dsync").join("config.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("dsync").join("config.toml"));
        }
        paths
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("REDIS_URL").filter(|v| !v.is_empty()) {
            self.redis_url = url;
        }
        if let Some(namespace) = var("DSYNC_NAMESPACE").filter(|v| !v.is_empty()) {
            self.namespace = namespace;
        }
    }
}
