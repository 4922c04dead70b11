//! # dsync codegen
//!
//! Renders artifacts for the current design system version: a `tokens.css`
//! stylesheet and a `design-system.md` reference document.

pub mod design_system;
pub mod stylesheet;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

pub use design_system::generate_design_system_md;
pub use stylesheet::generate_stylesheet;

/// A rendered file, not yet written.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub content: String,
    pub filename: String,
}

/// Write `artifact` into `out_dir`, creating the directory if needed.
pub fn write_artifact(artifact: &GeneratedArtifact, out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(&artifact.filename);
    std::fs::write(&path, &artifact.content).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = artifact.content.len(), "Wrote artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifact_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("ds");
        let artifact = GeneratedArtifact {
            content: ":root {\n}\n".to_string(),
            filename: "tokens.css".to_string(),
        };

        let path = write_artifact(&artifact, &out).unwrap();
        assert_eq!(path, out.join("tokens.css"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), ":root {\n}\n");
    }
}
