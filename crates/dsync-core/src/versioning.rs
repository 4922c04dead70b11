//! Semantic version bumps and changelog synthesis.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::diff::{display_value, Impact, TokenDiff};
use crate::error::{DsyncError, DsyncResult};

/// Version id given to the first token set.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Strict `major.minor.patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    /// Apply the bump policy for `impact`.
    ///
    /// Fails when the bumped component would overflow.
    pub fn bump(self, impact: Impact) -> DsyncResult<Self> {
        let overflow = || DsyncError::InvalidVersion(self.to_string());
        Ok(match impact {
            Impact::Breaking => Self {
                major: self.major.checked_add(1).ok_or_else(overflow)?,
                minor: 0,
                patch: 0,
            },
            Impact::High => Self {
                minor: self.minor.checked_add(1).ok_or_else(overflow)?,
                patch: 0,
                ..self
            },
            Impact::Medium | Impact::Low => Self {
                patch: self.patch.checked_add(1).ok_or_else(overflow)?,
                ..self
            },
        })
    }
}

impl FromStr for SemVer {
    type Err = DsyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(DsyncError::InvalidVersion(s.to_string()));
        };
        let num = |p: &str| p.parse::<u64>().map_err(|_| DsyncError::InvalidVersion(s.to_string()));
        Ok(Self {
            major: num(*major)?,
            minor: num(*minor)?,
            patch: num(*patch)?,
        })
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Next version id after `old` for a change of the given impact.
pub fn next_version(old: &str, impact: Impact) -> DsyncResult<String> {
    Ok(old.parse::<SemVer>()?.bump(impact)?.to_string())
}

/// Kind of a changelog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Update,
    Remove,
}

impl ChangeKind {
    /// Per-entry impact, fixed by kind regardless of the overall diff.
    pub fn impact(&self) -> Impact {
        match self {
            Self::Add => Impact::Low,
            Self::Update => Impact::Medium,
            Self::Remove => Impact::Breaking,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
        }
    }
}

/// One line of a version's changelog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub path: String,
    pub description: String,
    pub impact: Impact,
}

impl ChangelogEntry {
    pub fn new(kind: ChangeKind, path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            description: description.into(),
            impact: kind.impact(),
        }
    }
}

/// One entry per added, modified and removed path.
pub fn build_changelog(diff: &TokenDiff) -> Vec<ChangelogEntry> {
    let added = diff.added.iter().map(|c| {
        ChangelogEntry::new(
            ChangeKind::Add,
            &c.path,
            format!("Added token {} = {}", c.path, display_value(c.new_value.as_ref())),
        )
    });
    let modified = diff.modified.iter().map(|c| {
        ChangelogEntry::new(
            ChangeKind::Update,
            &c.path,
            format!(
                "Updated token {}: {} → {}",
                c.path,
                display_value(c.old_value.as_ref()),
                display_value(c.new_value.as_ref())
            ),
        )
    });
    let removed = diff
        .removed
        .iter()
        .map(|c| ChangelogEntry::new(ChangeKind::Remove, &c.path, format!("Removed token {}", c.path)));

    added.chain(modified).chain(removed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::tokens::TokenSet;
    use serde_json::json;

    #[test]
    fn test_next_version() {
        assert_eq!(next_version("1.2.3", Impact::Low).unwrap(), "1.2.4");
        assert_eq!(next_version("1.2.3", Impact::Medium).unwrap(), "1.2.4");
        assert_eq!(next_version("1.2.3", Impact::High).unwrap(), "1.3.0");
        assert_eq!(next_version("1.2.3", Impact::Breaking).unwrap(), "2.0.0");
    }

    #[test]
    fn test_invalid_versions() {
        assert!(next_version("1.2", Impact::Low).is_err());
        assert!(next_version("1.2.x", Impact::Low).is_err());
        assert!(next_version("1.2.3.4", Impact::Low).is_err());
    }

    #[test]
    fn test_bump_overflow_is_an_error() {
        let max = u64::MAX;
        assert!(matches!(
            next_version(&format!("{}.0.0", max), Impact::Breaking),
            Err(DsyncError::InvalidVersion(_))
        ));
        assert!(next_version(&format!("1.{}.0", max), Impact::High).is_err());
        assert!(next_version(&format!("1.0.{}", max), Impact::Low).is_err());
        // Only the bumped component matters.
        assert_eq!(next_version(&format!("1.0.{}", max), Impact::High).unwrap(), "1.1.0");
    }

    #[test]
    fn test_changelog_entry_impact_is_fixed_by_kind() {
        let mut old = TokenSet::new();
        old.set("color.a", json!("#000")).unwrap();
        old.set("color.b", json!("#111")).unwrap();
        let mut new = TokenSet::new();
        new.set("color.a", json!("#222")).unwrap();
        new.set("color.c", json!("#333")).unwrap();

        let d = diff(Some(&old), &new);
        assert_eq!(d.impact, Impact::Breaking);

        let log = build_changelog(&d);
        assert_eq!(log.len(), 3);
        assert_eq!((log[0].kind, log[0].impact), (ChangeKind::Add, Impact::Low));
        assert_eq!((log[1].kind, log[1].impact), (ChangeKind::Update, Impact::Medium));
        assert_eq!((log[2].kind, log[2].impact), (ChangeKind::Remove, Impact::Breaking));
        assert_eq!(log[1].description, "Updated token color.a: #000 → #222");
    }
}
