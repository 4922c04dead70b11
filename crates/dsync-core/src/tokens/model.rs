//! Design token domain model.
//!
//! Tokens live in an arbitrarily nested tree. A node carrying a `value`
//! field is a leaf [`Token`]; any other object is an intermediate
//! collection. The top-level keys of a [`TokenSet`] are the token
//! categories (`color`, `typography`, `spacing`, ...).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resolver;
use crate::error::{DsyncError, DsyncResult};

/// Dotted path → scalar value, produced on demand by flattening.
pub type FlatTokenMap = BTreeMap<String, Value>;

/// Mapping of name → token or nested collection.
pub type TokenCollection = BTreeMap<String, TokenNode>;

/// A single named design value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(alias = "$value")]
    pub value: Value,
    #[serde(default, alias = "$description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Token {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }
}

/// A node of the token tree.
///
/// Deserialization tries the leaf shape first, so an object is a token
/// exactly when it has a `value` (or `$value`) field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenNode {
    Token(Token),
    Collection(TokenCollection),
}

impl TokenNode {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Collection(_) => None,
        }
    }
}

/// Well-known token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Color,
    Typography,
    Spacing,
    Radius,
    Shadow,
    Breakpoint,
    Grid,
}

impl TokenCategory {
    pub const ALL: [TokenCategory; 7] = [
        Self::Color,
        Self::Typography,
        Self::Spacing,
        Self::Radius,
        Self::Shadow,
        Self::Breakpoint,
        Self::Grid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Typography => "typography",
            Self::Spacing => "spacing",
            Self::Radius => "radius",
            Self::Shadow => "shadow",
            Self::Breakpoint => "breakpoint",
            Self::Grid => "grid",
        }
    }

    /// Category of a dotted token path, from its first segment.
    pub fn of_path(path: &str) -> Option<Self> {
        let head = path.split('.').next()?;
        Self::ALL.into_iter().find(|c| c.as_str() == head)
    }
}

/// The full token tree of one version, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSet {
    categories: TokenCollection,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collection(categories: TokenCollection) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &TokenCollection {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Reject names that cannot be addressed by a dotted path: empty names
    /// and names containing `.` (`spacing."0.5"` would flatten to
    /// `spacing.0.5`, which no reference can walk back to).
    pub fn check_names(&self) -> DsyncResult<()> {
        check_collection_names(&self.categories, "")
    }

    /// Collapse the tree into dotted path → value pairs.
    pub fn flatten(&self) -> FlatTokenMap {
        resolver::flatten(&self.categories)
    }

    /// Number of leaf tokens.
    pub fn token_count(&self) -> usize {
        self.flatten().len()
    }

    /// Point read of the leaf at `path`.
    pub fn get(&self, path: &str) -> Option<&Token> {
        resolver::lookup(&self.categories, path.split('.'))?.as_token()
    }

    /// Resolve a reference against this set.
    ///
    /// Returns `None` when the path is missing or lands on a collection.
    pub fn resolve(&self, reference: &TokenReference) -> Option<&Value> {
        self.get(reference.path()).map(|t| &t.value)
    }

    /// String-level resolution: non-references come back as literals and
    /// unresolved references come back unchanged.
    pub fn resolve_str(&self, raw: &str) -> Value {
        resolver::resolve_reference(raw, self)
    }

    /// Write `value` at `path`, creating intermediate collections.
    ///
    /// Fails when a prefix of `path` is already a leaf token.
    pub fn set(&mut self, path: &str, value: Value) -> DsyncResult<()> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(DsyncError::invalid_path(path, "empty path segment"));
        }
        let (leaf, parents) = segments
            .split_last()
            .ok_or_else(|| DsyncError::invalid_path(path, "empty path"))?;

        let mut current = &mut self.categories;
        for (depth, segment) in parents.iter().enumerate() {
            let node = current
                .entry(segment.to_string())
                .or_insert_with(|| TokenNode::Collection(TokenCollection::new()));
            current = match node {
                TokenNode::Collection(children) => children,
                TokenNode::Token(_) => {
                    let prefix = segments[..=depth].join(".");
                    return Err(DsyncError::invalid_path(
                        path,
                        format!("'{}' is a token, not a collection", prefix),
                    ));
                }
            };
        }

        match current.get_mut(*leaf) {
            Some(TokenNode::Token(token)) => token.value = value,
            Some(TokenNode::Collection(_)) => {
                return Err(DsyncError::invalid_path(path, "path points at a collection"));
            }
            None => {
                current.insert(leaf.to_string(), TokenNode::Token(Token::new(value)));
            }
        }
        Ok(())
    }

    /// Remove the leaf at `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Token> {
        let segments: Vec<&str> = path.split('.').collect();
        let (leaf, parents) = segments.split_last()?;
        let mut current = &mut self.categories;
        for segment in parents {
            current = match current.get_mut(*segment)? {
                TokenNode::Collection(children) => children,
                TokenNode::Token(_) => return None,
            };
        }
        if !matches!(current.get(*leaf), Some(TokenNode::Token(_))) {
            return None;
        }
        match current.remove(*leaf) {
            Some(TokenNode::Token(token)) => Some(token),
            _ => None,
        }
    }
}

fn check_collection_names(collection: &TokenCollection, prefix: &str) -> DsyncResult<()> {
    for (name, node) in collection {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        if name.is_empty() || name.contains('.') {
            return Err(DsyncError::invalid_path(path, "token names cannot be empty or contain '.'"));
        }
        if let TokenNode::Collection(children) = node {
            check_collection_names(children, &path)?;
        }
    }
    Ok(())
}

/// A `{dotted.path}` pointer at another token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenReference(String);

impl TokenReference {
    /// Wrap a bare dotted path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Parse a braced reference. Anything not wrapped in `{...}` is a literal.
    pub fn parse(raw: &str) -> Option<Self> {
        let inner = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
        Some(Self(inner.trim().to_string()))
    }

    /// Accept either `{a.b}` or a bare `a.b`.
    pub fn from_path_or_reference(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| Self::new(raw.trim()))
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for TokenReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

/// A variant binding value: either a token reference or a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenRef {
    Reference(TokenReference),
    Literal(String),
}

impl TokenRef {
    pub fn as_reference(&self) -> Option<&TokenReference> {
        match self {
            Self::Reference(r) => Some(r),
            Self::Literal(_) => None,
        }
    }
}

impl From<String> for TokenRef {
    fn from(raw: String) -> Self {
        match TokenReference::parse(&raw) {
            Some(reference) => Self::Reference(reference),
            None => Self::Literal(raw),
        }
    }
}

impl From<TokenRef> for String {
    fn from(value: TokenRef) -> Self {
        match value {
            TokenRef::Reference(r) => r.to_string(),
            TokenRef::Literal(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TokenSet {
        serde_json::from_value(json!({
            "color": {
                "brand": {
                    "primary": { "value": "#0066CC", "description": "Brand blue" },
                    "secondary": { "$value": "#FF6600" }
                }
            },
            "spacing": { "md": { "value": 16 } }
        }))
        .unwrap()
    }

    #[test]
    fn test_leaf_detection() {
        let set = sample();
        let primary = set.get("color.brand.primary").unwrap();
        assert_eq!(primary.value, json!("#0066CC"));
        assert_eq!(primary.description.as_deref(), Some("Brand blue"));
        assert_eq!(set.get("color.brand.secondary").unwrap().value, json!("#FF6600"));
        assert!(set.get("color.brand").is_none());
        assert!(set.get("color.brand.primary.value").is_none());
    }

    #[test]
    fn test_set_creates_intermediate_collections() {
        let mut set = TokenSet::new();
        set.set("radius.card.lg", json!("12px")).unwrap();
        assert_eq!(set.get("radius.card.lg").unwrap().value, json!("12px"));

        set.set("radius.card.lg", json!("16px")).unwrap();
        assert_eq!(set.get("radius.card.lg").unwrap().value, json!("16px"));
    }

    #[test]
    fn test_set_rejects_descending_into_leaf() {
        let mut set = sample();
        let err = set.set("spacing.md.half", json!(8)).unwrap_err();
        assert!(matches!(err, DsyncError::InvalidTokenPath { .. }));
        assert!(set.set("color.brand", json!("#000")).is_err());
        assert!(set.set("color..x", json!("#000")).is_err());
    }

    #[test]
    fn test_remove_leaf() {
        let mut set = sample();
        let removed = set.remove("color.brand.secondary").unwrap();
        assert_eq!(removed.value, json!("#FF6600"));
        assert!(set.get("color.brand.secondary").is_none());
        assert!(set.remove("color.brand").is_none());
    }

    #[test]
    fn test_token_ref_serde() {
        let refs: Vec<TokenRef> = serde_json::from_value(json!(["{color.brand.primary}", "4px"])).unwrap();
        assert_eq!(
            refs[0],
            TokenRef::Reference(TokenReference::new("color.brand.primary"))
        );
        assert_eq!(refs[1], TokenRef::Literal("4px".to_string()));
        assert_eq!(
            serde_json::to_value(&refs).unwrap(),
            json!(["{color.brand.primary}", "4px"])
        );
    }

    #[test]
    fn test_check_names_rejects_dotted_keys() {
        assert!(sample().check_names().is_ok());

        let dotted: TokenSet = serde_json::from_value(json!({
            "spacing": { "0.5": { "value": "2px" }, "1": { "value": "4px" } }
        }))
        .unwrap();
        let err = dotted.check_names().unwrap_err();
        assert!(matches!(err, DsyncError::InvalidTokenPath { ref path, .. } if path == "spacing.0.5"));

        let empty: TokenSet = serde_json::from_value(json!({ "color": { "": { "value": "#000" } } })).unwrap();
        assert!(empty.check_names().is_err());
    }

    #[test]
    fn test_category_of_path() {
        assert_eq!(TokenCategory::of_path("color.brand.primary"), Some(TokenCategory::Color));
        assert_eq!(TokenCategory::of_path("motion.fast"), None);
    }
}
