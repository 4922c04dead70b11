//! Design system reference document.
//!
//! Generates `design-system.md` from a version: the CSS custom properties,
//! one table per token category, the component catalogue and the changelog
//! that produced the version.

use dsync_core::design::model::{DsComponent, Version};
use dsync_core::tokens::css::css_value;
use dsync_core::tokens::{css_variable_name, generate_css, TokenCategory, TokenRef};
use serde_json::Value;

use crate::GeneratedArtifact;

pub const DESIGN_SYSTEM_FILENAME: &str = "design-system.md";

/// Render the reference document for `version`.
pub fn generate_design_system_md(version: &Version) -> GeneratedArtifact {
    GeneratedArtifact {
        content: render_design_system_md(version),
        filename: DESIGN_SYSTEM_FILENAME.to_string(),
    }
}

fn render_design_system_md(version: &Version) -> String {
    let mut md = String::new();

    md.push_str("# Design System\n\n");
    md.push_str(&format!("> Version: {}\n", version.version));
    if let Some(origin) = &version.origin {
        md.push_str(&format!("> Source: {}\n", origin));
    }
    md.push_str(&format!("> Generated: {}\n\n", version.timestamp.to_rfc3339()));
    md.push_str("All UI implementation MUST use the design tokens defined below.\n\n");

    md.push_str("## CSS Custom Properties\n\n");
    md.push_str("```css\n");
    md.push_str(&generate_css(&version.tokens));
    md.push_str("```\n\n");

    render_token_tables(&mut md, version);

    if !version.components.is_empty() {
        md.push_str("## Components\n\n");
        for component in &version.components {
            render_component(&mut md, component);
        }
    }

    if !version.changelog.is_empty() {
        md.push_str("## Changelog\n\n");
        if version.breaking {
            md.push_str("**This version contains breaking changes.**\n\n");
        }
        for entry in &version.changelog {
            md.push_str(&format!(
                "- `{}` {} ({})\n",
                entry.kind.as_str(),
                entry.description,
                entry.impact.as_str()
            ));
        }
        md.push('\n');
    }

    md
}

fn render_token_tables(md: &mut String, version: &Version) {
    let flat = version.tokens.flatten();

    // Known categories first, in their canonical order, then anything else.
    let mut groups: Vec<(&str, Vec<(&String, &Value)>)> = TokenCategory::ALL
        .iter()
        .map(|c| (c.as_str(), Vec::new()))
        .collect();
    let mut other = Vec::new();
    for (path, value) in &flat {
        match TokenCategory::of_path(path) {
            Some(category) => {
                if let Some((_, rows)) = groups.iter_mut().find(|(name, _)| *name == category.as_str()) {
                    rows.push((path, value));
                }
            }
            None => other.push((path, value)),
        }
    }
    groups.push(("other", other));

    for (name, rows) in groups {
        if rows.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", title_case(name)));
        md.push_str("| Token | Property | Value |\n");
        md.push_str("|-------|----------|-------|\n");
        for (path, value) in rows {
            md.push_str(&format!(
                "| `{}` | `{}` | `{}` |\n",
                path,
                css_variable_name(path),
                css_value(value)
            ));
        }
        md.push('\n');
    }
}

fn render_component(md: &mut String, component: &DsComponent) {
    let mut heading = format!("### {} (`{}`)", component.name, component.id);
    if component.deprecated {
        heading.push_str(" (deprecated)");
    }
    md.push_str(&heading);
    md.push_str("\n\n");

    if component.deprecated {
        if let Some(successor) = &component.replaced_by {
            md.push_str(&format!("Use `{}` instead.\n\n", successor));
        }
    }
    if !component.category.is_empty() {
        md.push_str(&format!("- **Category:** {}\n", component.category));
    }
    md.push_str(&format!("- **Version:** {}\n", component.version));
    if let Some(states) = &component.states {
        if !states.is_empty() {
            md.push_str(&format!("- **States:** {}\n", states.join(", ")));
        }
    }

    if !component.props.is_empty() {
        md.push_str("\n| Prop | Type | Required | Default |\n");
        md.push_str("|------|------|----------|---------|\n");
        for prop in &component.props {
            let default = prop.default.as_ref().map(Value::to_string).unwrap_or_default();
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                prop.name,
                prop.prop_type,
                if prop.required { "yes" } else { "no" },
                default
            ));
        }
    }

    for variant in &component.variants {
        md.push_str(&format!("\n**Variant `{}`**\n\n", variant.name));
        for (property, token) in &variant.tokens {
            let rendered = match token {
                TokenRef::Reference(reference) => format!("`{}`", reference),
                TokenRef::Literal(literal) => literal.clone(),
            };
            md.push_str(&format!("- {}: {}\n", property, rendered));
        }
    }
    md.push('\n');
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn version() -> Version {
        Version {
            version: "2.0.0".to_string(),
            timestamp: Utc::now(),
            tokens: serde_json::from_value(json!({
                "color": { "brand": { "primary": { "value": "#0066CC" } } },
                "spacing": { "md": { "value": "16px" } },
                "motion": { "fast": { "value": "120ms" } }
            }))
            .unwrap(),
            components: serde_json::from_value(json!([{
                "id": "button",
                "name": "Button",
                "version": "1.0.0",
                "props": [{ "name": "label", "type": "string", "required": true }],
                "variants": [{ "name": "primary", "tokens": { "background": "{color.brand.primary}" } }],
                "deprecated": true,
                "replacedBy": "action-button"
            }]))
            .unwrap(),
            changelog: vec![],
            breaking: true,
            origin: Some("Brand kit".to_string()),
        }
    }

    #[test]
    fn test_render_sections() {
        let artifact = generate_design_system_md(&version());
        let md = &artifact.content;

        assert_eq!(artifact.filename, "design-system.md");
        assert!(md.contains("> Version: 2.0.0"));
        assert!(md.contains("> Source: Brand kit"));
        assert!(md.contains("  --color-brand-primary: #0066CC;"));
        assert!(md.contains("## Color\n"));
        assert!(md.contains("| `spacing.md` | `--spacing-md` | `16px` |"));
        assert!(md.contains("## Other\n"));
        assert!(md.contains("Use `action-button` instead."));
        assert!(md.contains("- background: `{color.brand.primary}`"));
        assert!(!md.contains("## Changelog"));
        assert!(md.find("## Color").unwrap() < md.find("## Spacing").unwrap());
    }

    #[test]
    fn test_stylesheet_header() {
        let css = crate::generate_stylesheet(&version());
        assert_eq!(css.filename, "tokens.css");
        assert!(css.content.starts_with("/* Design tokens v2.0.0"));
        assert!(css.content.ends_with("}\n"));
    }
}
