//! Writing resolved token values into builder nodes.

use serde_json::Value;

use super::model::Binding;
use crate::design::model::Version;
use crate::node::{ComponentNode, DS_VERSION_PROP, TOKENS_APPLIED_PROP};

/// Apply `binding`'s token bindings from `version` to `node`.
///
/// Leaves the node untouched when there is no enabled binding or no active
/// version. Only bindings that resolve and name a `cssProperty` write into
/// the style map. Applying twice gives the same result as applying once.
/// Returns whether the node was stamped.
pub fn apply_tokens_to_node(node: &mut ComponentNode, binding: Option<&Binding>, version: Option<&Version>) -> bool {
    let (Some(binding), Some(version)) = (binding, version) else {
        return false;
    };
    if !binding.enabled {
        return false;
    }

    for token_binding in &binding.token_bindings {
        let Some(property) = token_binding.css_property.as_deref() else {
            continue;
        };
        let reference = token_binding.reference();
        let Some(value) = version.tokens.resolve(&reference) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let value = match token_binding.transform {
            Some(transform) => transform.apply(reference.path(), value),
            None => value.clone(),
        };
        node.style.insert(property.to_string(), value);
    }

    node.props.insert(TOKENS_APPLIED_PROP.to_string(), Value::Bool(true));
    node.props
        .insert(DS_VERSION_PROP.to_string(), Value::String(version.version.clone()));
    true
}

/// Apply tokens to every node of a tree, looking bindings up by node type.
/// Returns the number of nodes stamped.
pub fn apply_tokens_to_tree<'b>(
    root: &mut ComponentNode,
    lookup: &impl Fn(&str) -> Option<&'b Binding>,
    version: Option<&Version>,
) -> usize {
    let mut applied = 0;
    root.walk_mut(&mut |node| {
        let binding = lookup(&node.component_type);
        if apply_tokens_to_node(node, binding, version) {
            applied += 1;
        }
    });
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenSet;
    use chrono::Utc;
    use serde_json::json;

    fn version() -> Version {
        Version {
            version: "1.2.0".to_string(),
            timestamp: Utc::now(),
            tokens: serde_json::from_value::<TokenSet>(json!({
                "color": { "brand": { "primary": { "value": "#0066CC" } }, "text": { "value": "#FFFFFF" } },
                "spacing": { "md": { "value": 16 } }
            }))
            .unwrap(),
            components: Vec::new(),
            changelog: Vec::new(),
            breaking: false,
            origin: None,
        }
    }

    fn binding() -> Binding {
        serde_json::from_value(json!({
            "cmsComponentType": "button",
            "dsComponentId": "button",
            "version": "1.0.0",
            "tokenBindings": [
                { "cmsProp": "bg", "tokenPath": "color.brand.primary", "cssProperty": "backgroundColor" },
                { "cmsProp": "fg", "tokenPath": "{color.text}", "cssProperty": "color" },
                { "cmsProp": "pad", "tokenPath": "spacing.md", "cssProperty": "padding", "transform": "px" },
                { "cmsProp": "label", "tokenPath": "spacing.md" },
                { "cmsProp": "border", "tokenPath": "color.missing", "cssProperty": "borderColor" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_apply_writes_resolved_styles() {
        let mut node = ComponentNode::new("n1", "button");
        assert!(apply_tokens_to_node(&mut node, Some(&binding()), Some(&version())));

        assert_eq!(node.style["backgroundColor"], json!("#0066CC"));
        assert_eq!(node.style["color"], json!("#FFFFFF"));
        assert_eq!(node.style["padding"], json!("16px"));
        assert!(!node.style.contains_key("borderColor"));
        assert_eq!(node.style.len(), 3);
        assert!(node.tokens_applied());
        assert_eq!(node.applied_version(), Some("1.2.0"));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut once = ComponentNode::new("n1", "button");
        apply_tokens_to_node(&mut once, Some(&binding()), Some(&version()));
        let mut twice = once.clone();
        apply_tokens_to_node(&mut twice, Some(&binding()), Some(&version()));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_disabled_or_missing_binding_is_noop() {
        let mut node = ComponentNode::new("n1", "button");
        let mut disabled = binding();
        disabled.enabled = false;
        assert!(!apply_tokens_to_node(&mut node, Some(&disabled), Some(&version())));
        assert!(!apply_tokens_to_node(&mut node, None, Some(&version())));
        assert!(!apply_tokens_to_node(&mut node, Some(&binding()), None));
        assert_eq!(node, ComponentNode::new("n1", "button"));
    }

    #[test]
    fn test_apply_to_tree_recurses_into_slots() {
        let mut tree: ComponentNode = serde_json::from_value(json!({
            "id": "root", "type": "section",
            "children": [{ "id": "a", "type": "button" }],
            "slots": { "actions": [{ "id": "b", "type": "button" }] }
        }))
        .unwrap();
        let b = binding();
        let applied = apply_tokens_to_tree(&mut tree, &|ty| (ty == "button").then_some(&b), Some(&version()));
        assert_eq!(applied, 2);
        assert!(!tree.tokens_applied());
        assert!(tree.slots["actions"][0].tokens_applied());
    }
}
