//! Binding domain model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tokens::{css_variable_name, TokenReference};

/// Associates a builder component type with a design system component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub cms_component_type: String,
    pub ds_component_id: String,
    /// Builder variant name → design system variant name.
    #[serde(default)]
    pub variant_mapping: BTreeMap<String, String>,
    /// Design system prop name → builder prop name.
    #[serde(default)]
    pub prop_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub token_bindings: Vec<TokenBinding>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Design system component version this binding was written against.
    pub version: String,
}

fn default_enabled() -> bool {
    true
}

impl Binding {
    /// Builder prop that carries the design system prop `ds_prop`.
    pub fn cms_prop_for<'a>(&'a self, ds_prop: &'a str) -> &'a str {
        self.prop_mapping.get(ds_prop).map(String::as_str).unwrap_or(ds_prop)
    }
}

/// Pulls one builder prop / style property from a token path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBinding {
    pub cms_prop: String,
    /// Dotted path, with or without surrounding braces.
    pub token_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TokenTransform>,
}

impl TokenBinding {
    pub fn reference(&self) -> TokenReference {
        TokenReference::from_path_or_reference(&self.token_path)
    }
}

/// Conversion applied to a resolved token before it is written to a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenTransform {
    /// Bare numbers get a `px` suffix.
    Px,
    /// Numbers and `Npx` strings become `rem` against a 16px root.
    Rem,
    /// Write `var(--path)` instead of the literal value.
    CssVar,
}

impl TokenTransform {
    pub fn apply(&self, path: &str, value: &Value) -> Value {
        match self {
            Self::Px => match value.as_f64() {
                Some(n) => Value::String(format!("{}px", format_number(n))),
                None => value.clone(),
            },
            Self::Rem => {
                let px = value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| s.strip_suffix("px")).and_then(|s| s.trim().parse().ok()));
                match px {
                    Some(n) => Value::String(format!("{}rem", format_number(n / 16.0))),
                    None => value.clone(),
                }
            }
            Self::CssVar => Value::String(format!("var({})", css_variable_name(path))),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binding_defaults() {
        let binding: Binding = serde_json::from_value(json!({
            "cmsComponentType": "hero-button",
            "dsComponentId": "button",
            "version": "1.0.0",
            "tokenBindings": [
                { "cmsProp": "bg", "tokenPath": "{color.brand.primary}", "cssProperty": "backgroundColor" },
                { "cmsProp": "pad", "tokenPath": "spacing.md", "transform": "px" }
            ]
        }))
        .unwrap();

        assert!(binding.enabled);
        assert_eq!(binding.token_bindings[0].reference().path(), "color.brand.primary");
        assert_eq!(binding.token_bindings[1].reference().path(), "spacing.md");
        assert_eq!(binding.token_bindings[1].transform, Some(TokenTransform::Px));
        assert_eq!(binding.cms_prop_for("label"), "label");
    }

    #[test]
    fn test_transforms() {
        assert_eq!(TokenTransform::Px.apply("spacing.md", &json!(16)), json!("16px"));
        assert_eq!(TokenTransform::Px.apply("spacing.md", &json!("1rem")), json!("1rem"));
        assert_eq!(TokenTransform::Rem.apply("spacing.md", &json!(24)), json!("1.5rem"));
        assert_eq!(TokenTransform::Rem.apply("spacing.md", &json!("32px")), json!("2rem"));
        assert_eq!(
            TokenTransform::CssVar.apply("color.brand.primary", &json!("#0066CC")),
            json!("var(--color-brand-primary)")
        );
    }
}
