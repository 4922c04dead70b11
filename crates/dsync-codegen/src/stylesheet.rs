//! `tokens.css` generation.

use dsync_core::design::model::Version;
use dsync_core::tokens::generate_css;

use crate::GeneratedArtifact;

pub const STYLESHEET_FILENAME: &str = "tokens.css";

/// Stylesheet with one custom property per token of `version`.
pub fn generate_stylesheet(version: &Version) -> GeneratedArtifact {
    let mut content = format!(
        "/* Design tokens v{} ({}). Generated by dsync, do not edit. */\n",
        version.version,
        version.timestamp.format("%Y-%m-%d %H:%M UTC")
    );
    content.push_str(&generate_css(&version.tokens));

    GeneratedArtifact {
        content,
        filename: STYLESHEET_FILENAME.to_string(),
    }
}
