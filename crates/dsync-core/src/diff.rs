//! Structural diff between two token sets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tokens::TokenSet;

/// Number of modified tokens above which a diff counts as `high`.
pub const HIGH_IMPACT_MODIFICATIONS: usize = 10;

/// Severity of a change set. Drives the semantic version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
    Breaking,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Breaking => "breaking",
        }
    }
}

/// One changed token path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenChange {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// A path that moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRename {
    pub from: String,
    pub to: String,
}

/// How references to `from` should be carried forward.
///
/// Diff-derived rules have `from == to` and annotate a value update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRule {
    pub from: String,
    pub to: String,
    pub automatic: bool,
    #[serde(default)]
    pub notes: String,
}

impl MigrationRule {
    /// True when the rule rewrites references to a different path.
    pub fn is_rename(&self) -> bool {
        self.from != self.to
    }
}

/// Result of comparing two token sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDiff {
    pub added: Vec<TokenChange>,
    pub modified: Vec<TokenChange>,
    pub removed: Vec<TokenChange>,
    /// Always empty: rename detection needs product rules that do not exist yet.
    pub renamed: Vec<TokenRename>,
    pub impact: Impact,
    pub migrations: Vec<MigrationRule>,
}

impl TokenDiff {
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }

    pub fn total_changes(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len() + self.renamed.len()
    }
}

/// Classify a change set. Removals dominate regardless of count.
pub fn classify_impact(removed: usize, modified: usize) -> Impact {
    if removed > 0 {
        Impact::Breaking
    } else if modified > HIGH_IMPACT_MODIFICATIONS {
        Impact::High
    } else if modified > 0 {
        Impact::Medium
    } else {
        Impact::Low
    }
}

/// Compare `old` (the active set, if any) against `new`.
pub fn diff(old: Option<&TokenSet>, new: &TokenSet) -> TokenDiff {
    let old_flat = old.map(TokenSet::flatten).unwrap_or_default();
    let new_flat = new.flatten();

    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut removed = Vec::new();

    for (path, new_value) in &new_flat {
        match old_flat.get(path) {
            None => added.push(TokenChange {
                path: path.clone(),
                old_value: None,
                new_value: Some(new_value.clone()),
            }),
            Some(old_value) if old_value != new_value => modified.push(TokenChange {
                path: path.clone(),
                old_value: Some(old_value.clone()),
                new_value: Some(new_value.clone()),
            }),
            Some(_) => {}
        }
    }

    for (path, old_value) in &old_flat {
        if !new_flat.contains_key(path) {
            removed.push(TokenChange {
                path: path.clone(),
                old_value: Some(old_value.clone()),
                new_value: None,
            });
        }
    }

    let migrations = modified
        .iter()
        .map(|change| MigrationRule {
            from: change.path.clone(),
            to: change.path.clone(),
            automatic: true,
            notes: format!(
                "{}→{}",
                display_value(change.old_value.as_ref()),
                display_value(change.new_value.as_ref())
            ),
        })
        .collect();

    TokenDiff {
        impact: classify_impact(removed.len(), modified.len()),
        added,
        modified,
        removed,
        renamed: Vec::new(),
        migrations,
    }
}

/// Render a token value for changelog text: strings bare, the rest as JSON.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
