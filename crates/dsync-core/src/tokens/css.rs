//! CSS custom property generation.

use serde_json::Value;

use super::model::{TokenReference, TokenSet};

/// Custom property name for a dotted token path.
pub fn css_variable_name(path: &str) -> String {
    format!("--{}", path.replace('.', "-"))
}

/// Render a token value as a CSS value.
///
/// Values that are themselves references become `var(...)` so aliases stay
/// live in the browser.
pub fn css_value(value: &Value) -> String {
    match value {
        Value::String(s) => match TokenReference::parse(s) {
            Some(reference) => format!("var({})", css_variable_name(reference.path())),
            None => s.clone(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Generate a `:root { ... }` block with one custom property per token.
pub fn generate_css(tokens: &TokenSet) -> String {
    let mut css = String::from(":root {\n");
    for (path, value) in tokens.flatten() {
        css.push_str(&format!("  {}: {};\n", css_variable_name(&path), css_value(&value)));
    }
    css.push_str("}\n");
    css
}
