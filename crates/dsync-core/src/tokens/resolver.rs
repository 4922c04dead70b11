//! Flattening and reference resolution.

use serde_json::Value;

use super::model::{FlatTokenMap, TokenCollection, TokenNode, TokenReference, TokenSet};

/// Collapse a token tree into dotted path → value pairs.
///
/// Leaves are emitted at their full path; collections are descended into.
/// Token trees are owned JSON trees, so the walk always terminates.
pub fn flatten(collection: &TokenCollection) -> FlatTokenMap {
    let mut out = FlatTokenMap::new();
    flatten_into(collection, "", &mut out);
    out
}

fn flatten_into(collection: &TokenCollection, prefix: &str, out: &mut FlatTokenMap) {
    for (name, node) in collection {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match node {
            TokenNode::Token(token) => {
                out.insert(path, token.value.clone());
            }
            TokenNode::Collection(children) => flatten_into(children, &path, out),
        }
    }
}

/// Walk `segments` down the tree.
pub fn lookup<'a, 'p>(
    collection: &'a TokenCollection,
    segments: impl IntoIterator<Item = &'p str>,
) -> Option<&'a TokenNode> {
    let mut segments = segments.into_iter();
    let mut node = collection.get(segments.next()?)?;
    for segment in segments {
        node = match node {
            TokenNode::Collection(children) => children.get(segment)?,
            TokenNode::Token(_) => return None,
        };
    }
    Some(node)
}

/// Resolve a raw string that may be a `{path}` reference.
///
/// Literals come back unchanged. A reference whose walk fails, or that
/// lands on a collection, also comes back unchanged as a string; callers
/// compare against the input to detect "unresolved".
pub fn resolve_reference(raw: &str, tokens: &TokenSet) -> Value {
    let Some(reference) = TokenReference::parse(raw) else {
        return Value::String(raw.to_string());
    };
    match tokens.resolve(&reference) {
        Some(value) => value.clone(),
        None => Value::String(raw.to_string()),
    }
}

/// True when `raw` is a reference that does not resolve against `tokens`.
pub fn is_unresolved(raw: &str, tokens: &TokenSet) -> bool {
    match TokenReference::parse(raw) {
        Some(reference) => tokens.resolve(&reference).is_none(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::model::Token;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample() -> TokenSet {
        serde_json::from_value(json!({
            "color": {
                "brand": {
                    "primary": { "500": { "value": "#0066CC" } },
                    "tertiary": { "value": "#00AA88" }
                }
            },
            "spacing": { "sm": { "value": 8 }, "md": { "value": 16 } }
        }))
        .unwrap()
    }

    #[test]
    fn test_flatten_paths() {
        let flat = sample().flatten();
        assert_eq!(flat.len(), 4);
        assert_eq!(flat["color.brand.primary.500"], json!("#0066CC"));
        assert_eq!(flat["spacing.md"], json!(16));
    }

    #[test]
    fn test_resolve_reference() {
        let set = sample();
        assert_eq!(resolve_reference("{color.brand.tertiary}", &set), json!("#00AA88"));
        assert_eq!(resolve_reference("{spacing.sm}", &set), json!(8));
        // Literals pass through.
        assert_eq!(resolve_reference("#FFFFFF", &set), json!("#FFFFFF"));
    }

    #[test]
    fn test_unresolved_reference_returned_unchanged() {
        let set = sample();
        assert_eq!(resolve_reference("{color.brand.missing}", &set), json!("{color.brand.missing}"));
        // Lands on a collection.
        assert_eq!(resolve_reference("{color.brand}", &set), json!("{color.brand}"));
        assert_eq!(resolve_reference("{}", &set), json!("{}"));
        assert!(is_unresolved("{color.brand}", &set));
        assert!(!is_unresolved("{spacing.md}", &set));
        assert!(!is_unresolved("16px", &set));
    }

    #[test]
    fn test_dotted_key_does_not_round_trip() {
        let set: TokenSet = serde_json::from_value(json!({
            "spacing": { "0.5": { "value": "2px" } }
        }))
        .unwrap();
        let flat = set.flatten();
        assert_eq!(flat["spacing.0.5"], json!("2px"));
        // The flattened path walks `spacing` → `0` → `5`, so it never resolves.
        assert_eq!(resolve_reference("{spacing.0.5}", &set), json!("{spacing.0.5}"));
        assert!(is_unresolved("{spacing.0.5}", &set));
        assert!(set.check_names().is_err());
    }

    fn token_node() -> impl Strategy<Value = TokenNode> {
        let leaf = prop_oneof![
            "[a-z0-9#]{1,8}".prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
        ]
        .prop_map(|v| TokenNode::Token(Token::new(v)));
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop::collection::btree_map("[a-z]{1,5}", inner, 1..4).prop_map(TokenNode::Collection)
        })
    }

    proptest! {
        #[test]
        fn prop_flatten_resolve_round_trip(
            categories in prop::collection::btree_map("[a-z]{1,5}", token_node(), 0..4)
        ) {
            let set = TokenSet::from_collection(categories);
            for (path, value) in set.flatten() {
                let resolved = resolve_reference(&format!("{{{}}}", path), &set);
                prop_assert_eq!(resolved, value);
            }
        }
    }
}
