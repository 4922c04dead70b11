//! Design system domain model.
//!
//! A [`Version`] is an immutable snapshot of the whole design system:
//! the token tree, the abstract component definitions and the changelog
//! that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::tokens::{TokenRef, TokenSet};
use crate::versioning::ChangelogEntry;

/// One immutable design system snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub tokens: TokenSet,
    #[serde(default)]
    pub components: Vec<DsComponent>,
    #[serde(default)]
    pub changelog: Vec<ChangelogEntry>,
    #[serde(default)]
    pub breaking: bool,
    /// What produced this version (a source name, `manual`, `import`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Version {
    pub fn component(&self, id: &str) -> Option<&DsComponent> {
        self.components.iter().find(|c| c.id == id)
    }
}

/// Abstract design system component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsComponent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub props: Vec<PropDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<String>>,
    pub version: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<String>,
}

impl DsComponent {
    pub fn required_props(&self) -> impl Iterator<Item = &PropDef> {
        self.props.iter().filter(|p| p.required)
    }

    pub fn variant_names(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.name.as_str()).collect()
    }
}

/// A named variant with its property → token bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenRef>,
}

/// A component property definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub prop_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_from_json() {
        let component: DsComponent = serde_json::from_value(json!({
            "id": "button",
            "name": "Button",
            "category": "actions",
            "variants": [
                { "name": "primary", "tokens": { "backgroundColor": "{color.brand.primary}" } },
                { "name": "ghost", "tokens": { "backgroundColor": "transparent" } }
            ],
            "props": [
                { "name": "label", "type": "string", "required": true },
                { "name": "icon", "type": "string" }
            ],
            "version": "1.0.0",
            "replacedBy": "button-v2"
        }))
        .unwrap();

        assert_eq!(component.variant_names(), vec!["primary", "ghost"]);
        assert_eq!(component.required_props().count(), 1);
        assert_eq!(component.replaced_by.as_deref(), Some("button-v2"));
        assert!(!component.deprecated);
        assert!(component.variants[0].tokens["backgroundColor"].as_reference().is_some());
        assert!(component.variants[1].tokens["backgroundColor"].as_reference().is_none());
    }
}
