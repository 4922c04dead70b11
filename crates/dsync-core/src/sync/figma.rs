//! Token extraction from Figma file documents.
//!
//! SOLID fills become `color.<frame>.<node>` tokens and TEXT nodes become
//! `typography.<node>.*` tokens. Both the `/files/:key` response (a single
//! `document`) and the `/files/:key/nodes` response (a `nodes` map) are
//! accepted.

use serde_json::{json, Value};

use crate::error::{DsyncError, DsyncResult};
use crate::tokens::TokenSet;

const ROOT_GROUP: &str = "base";

/// Build a token set from a Figma API response.
pub fn extract_tokens(response: &Value) -> DsyncResult<TokenSet> {
    let mut tokens = TokenSet::new();

    if let Some(document) = response.get("document") {
        visit(document, None, &mut tokens)?;
    } else if let Some(nodes) = response.get("nodes").and_then(Value::as_object) {
        for entry in nodes.values() {
            if let Some(document) = entry.get("document") {
                visit(document, None, &mut tokens)?;
            }
        }
    } else {
        return Err(DsyncError::fetch("figma", "response has neither 'document' nor 'nodes'"));
    }

    Ok(tokens)
}

fn visit(node: &Value, frame: Option<&str>, tokens: &mut TokenSet) -> DsyncResult<()> {
    if node.get("visible").and_then(Value::as_bool) == Some(false) {
        return Ok(());
    }

    let name = node.get("name").and_then(Value::as_str).map(token_name).unwrap_or_default();
    let kind = node.get("type").and_then(Value::as_str).unwrap_or_default();

    if !name.is_empty() {
        if kind == "TEXT" {
            extract_typography(node, &name, tokens)?;
        } else if let Some(color) = solid_fill(node) {
            let group = frame.unwrap_or(ROOT_GROUP);
            tokens.set(&format!("color.{}.{}", group, name), Value::String(color))?;
        }
    }

    let child_frame = match kind {
        "FRAME" | "COMPONENT" | "COMPONENT_SET" if !name.is_empty() => Some(name.as_str()),
        _ => frame,
    };
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            visit(child, child_frame, tokens)?;
        }
    }
    Ok(())
}

/// First visible SOLID fill as `#RRGGBB`, or `rgba(..)` when translucent.
fn solid_fill(node: &Value) -> Option<String> {
    let fill = node
        .get("fills")?
        .as_array()?
        .iter()
        .find(|f| f.get("type").and_then(Value::as_str) == Some("SOLID") && f.get("visible").and_then(Value::as_bool) != Some(false))?;
    let color = fill.get("color")?;
    let channel = |key: &str| color.get(key).and_then(Value::as_f64).map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    let (r, g, b) = (channel("r")?, channel("g")?, channel("b")?);
    let alpha = color.get("a").and_then(Value::as_f64).unwrap_or(1.0) * fill.get("opacity").and_then(Value::as_f64).unwrap_or(1.0);

    if alpha < 1.0 {
        let alpha = (alpha * 100.0).round() / 100.0;
        Some(format!("rgba({}, {}, {}, {})", r, g, b, alpha))
    } else {
        Some(format!("#{:02X}{:02X}{:02X}", r, g, b))
    }
}

fn extract_typography(node: &Value, name: &str, tokens: &mut TokenSet) -> DsyncResult<()> {
    let Some(style) = node.get("style") else {
        return Ok(());
    };
    let fields = [
        ("fontFamily", style.get("fontFamily").cloned()),
        ("fontSize", style.get("fontSize").cloned()),
        ("fontWeight", style.get("fontWeight").cloned()),
        ("lineHeight", style.get("lineHeightPx").map(|v| json!(v))),
    ];
    for (field, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_null()) {
            tokens.set(&format!("typography.{}.{}", name, field), value)?;
        }
    }
    Ok(())
}

/// Lowercase, hyphen-separated path segment.
fn token_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Value {
        json!({
            "document": {
                "type": "DOCUMENT",
                "name": "Document",
                "children": [{
                    "type": "CANVAS",
                    "name": "Page 1",
                    "children": [{
                        "type": "FRAME",
                        "name": "Brand Colors",
                        "children": [
                            { "type": "RECTANGLE", "name": "Primary", "fills": [{ "type": "SOLID", "color": { "r": 0.0, "g": 0.4, "b": 0.8, "a": 1.0 } }] },
                            { "type": "RECTANGLE", "name": "Overlay", "fills": [{ "type": "SOLID", "opacity": 0.5, "color": { "r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0 } }] },
                            { "type": "RECTANGLE", "name": "Hidden", "visible": false, "fills": [{ "type": "SOLID", "color": { "r": 1.0, "g": 1.0, "b": 1.0 } }] },
                            { "type": "RECTANGLE", "name": "Gradient", "fills": [{ "type": "GRADIENT_LINEAR" }] },
                            { "type": "TEXT", "name": "Heading XL", "style": { "fontFamily": "Inter", "fontSize": 32, "fontWeight": 700, "lineHeightPx": 38.4 } }
                        ]
                    }]
                }]
            }
        })
    }

    #[test]
    fn test_extracts_colors_and_typography() {
        let tokens = extract_tokens(&document()).unwrap();
        let flat = tokens.flatten();

        assert_eq!(flat["color.brand-colors.primary"], json!("#0066CC"));
        assert_eq!(flat["color.brand-colors.overlay"], json!("rgba(0, 0, 0, 0.5)"));
        assert_eq!(flat["typography.heading-xl.fontFamily"], json!("Inter"));
        assert_eq!(flat["typography.heading-xl.fontSize"], json!(32));
        assert_eq!(flat["typography.heading-xl.lineHeight"], json!(38.4));
        assert!(!flat.keys().any(|k| k.contains("hidden") || k.contains("gradient")));
    }

    #[test]
    fn test_nodes_response_shape() {
        let response = json!({
            "nodes": {
                "1:2": { "document": { "type": "RECTANGLE", "name": "Accent", "fills": [{ "type": "SOLID", "color": { "r": 1.0, "g": 0.0, "b": 1.0 } }] } }
            }
        });
        let tokens = extract_tokens(&response).unwrap();
        assert_eq!(tokens.flatten()["color.base.accent"], json!("#FF00FF"));
    }

    #[test]
    fn test_unknown_shape_is_a_fetch_error() {
        let err = extract_tokens(&json!({ "status": 404 })).unwrap_err();
        assert!(matches!(err, DsyncError::Fetch { .. }));
    }
}
