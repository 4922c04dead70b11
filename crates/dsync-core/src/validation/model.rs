//! Validation report types.

use serde::{Deserialize, Serialize};

/// Severity of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    /// Reserved; no rule produces it yet.
    Critical,
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    UnboundComponent,
    MissingComponent,
    MissingRequiredProp,
    UnresolvedToken,
    TokensNotApplied,
    OutdatedVersion,
    LowContrast,
    DeprecatedComponent,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnboundComponent => "unbound_component",
            Self::MissingComponent => "missing_component",
            Self::MissingRequiredProp => "missing_required_prop",
            Self::UnresolvedToken => "unresolved_token",
            Self::TokensNotApplied => "tokens_not_applied",
            Self::OutdatedVersion => "outdated_version",
            Self::LowContrast => "low_contrast",
            Self::DeprecatedComponent => "deprecated_component",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub node_id: String,
    pub code: IssueCode,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub node_id: String,
    pub code: IssueCode,
    pub message: String,
    pub auto_fixable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Outcome of validating a node or a tree. Recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub suggestions: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn error(&mut self, node_id: &str, code: IssueCode, message: impl Into<String>) {
        self.errors.push(ValidationError {
            node_id: node_id.to_string(),
            code,
            message: message.into(),
            severity: Severity::Error,
        });
        self.valid = false;
    }

    pub fn warning(&mut self, node_id: &str, code: IssueCode, message: impl Into<String>, auto_fixable: bool) -> &mut ValidationWarning {
        self.warnings.push(ValidationWarning {
            node_id: node_id.to_string(),
            code,
            message: message.into(),
            auto_fixable,
            suggestion: None,
        });
        let last = self.warnings.len() - 1;
        &mut self.warnings[last]
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid &= other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.suggestions.extend(other.suggestions);
    }

    pub fn auto_fixable(&self) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings.iter().filter(|w| w.auto_fixable)
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code) || self.warnings.iter().any(|w| w.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_folds_validity() {
        let mut tree = ValidationResult::default();
        let mut ok = ValidationResult::default();
        ok.warning("a", IssueCode::TokensNotApplied, "tokens not applied", true);
        tree.merge(ok);
        assert!(tree.valid);

        let mut bad = ValidationResult::default();
        bad.error("b", IssueCode::MissingComponent, "missing");
        tree.merge(bad);
        assert!(!tree.valid);
        assert_eq!(tree.errors.len(), 1);
        assert_eq!(tree.auto_fixable().count(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let mut result = ValidationResult::default();
        result
            .warning("n1", IssueCode::OutdatedVersion, "DS out of date", true)
            .suggestion = Some("re-apply tokens".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["warnings"][0]["autoFixable"], true);
        assert_eq!(json["warnings"][0]["code"], "outdated_version");
        assert_eq!(json["warnings"][0]["nodeId"], "n1");
    }
}
