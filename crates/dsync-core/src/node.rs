//! Builder component tree.
//!
//! The page builder owns rendering; dsync only sees the tree shape: a
//! node type, its props, its style map and nested children/slots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prop stamped once tokens have been applied to a node.
pub const TOKENS_APPLIED_PROP: &str = "__dsTokensApplied";

/// Prop recording which design system version was applied.
pub const DS_VERSION_PROP: &str = "__dsVersion";

/// One builder component instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
    #[serde(default)]
    pub style: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, Vec<ComponentNode>>,
}

impl ComponentNode {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            ..Default::default()
        }
    }

    pub fn tokens_applied(&self) -> bool {
        matches!(self.props.get(TOKENS_APPLIED_PROP), Some(Value::Bool(true)))
    }

    pub fn applied_version(&self) -> Option<&str> {
        self.props.get(DS_VERSION_PROP).and_then(Value::as_str)
    }

    pub fn style_str(&self, property: &str) -> Option<&str> {
        self.style.get(property).and_then(Value::as_str)
    }

    /// Direct descendants: children first, then every slot in key order.
    pub fn child_nodes(&self) -> impl Iterator<Item = &ComponentNode> {
        self.children.iter().chain(self.slots.values().flatten())
    }

    pub fn child_nodes_mut(&mut self) -> impl Iterator<Item = &mut ComponentNode> {
        self.children.iter_mut().chain(self.slots.values_mut().flatten())
    }

    /// Pre-order visit of this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ComponentNode)) {
        visit(self);
        for child in self.child_nodes() {
            child.walk(visit);
        }
    }

    /// Pre-order mutable visit of this node and all descendants.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut ComponentNode)) {
        visit(self);
        for child in self.child_nodes_mut() {
            child.walk_mut(visit);
        }
    }

    /// Number of nodes in this subtree.
    pub fn count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_walk_covers_children_and_slots() {
        let tree: ComponentNode = serde_json::from_value(json!({
            "id": "root",
            "type": "section",
            "children": [{ "id": "a", "type": "text" }],
            "slots": {
                "footer": [{ "id": "b", "type": "button" }],
                "header": [{ "id": "c", "type": "text", "children": [{ "id": "d", "type": "icon" }] }]
            }
        }))
        .unwrap();

        let mut ids = Vec::new();
        tree.walk(&mut |n| ids.push(n.id.clone()));
        assert_eq!(ids, vec!["root", "a", "b", "c", "d"]);
        assert_eq!(tree.count(), 5);
    }

    #[test]
    fn test_stamp_accessors() {
        let mut node = ComponentNode::new("n", "button");
        assert!(!node.tokens_applied());
        node.props.insert(TOKENS_APPLIED_PROP.to_string(), json!(true));
        node.props.insert(DS_VERSION_PROP.to_string(), json!("1.0.0"));
        assert!(node.tokens_applied());
        assert_eq!(node.applied_version(), Some("1.0.0"));
    }
}
