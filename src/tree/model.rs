//! Decision tree model.
//!
//! A tree is an insertion-ordered map from a label (question, decision or
//! statement) to a [`Node`]. On the wire it is a plain JSON object whose
//! leaves are either the unresolved marker string or an observed outcome.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Marker written for an outcome that has not been observed yet.
pub const UNRESOLVED: &str = "Unknown";

/// Leaf strings read back as [`Node::Unresolved`].
const UNRESOLVED_TOKENS: &[&str] = &[UNRESOLVED, "Unresolved"];

/// Keys removed by [`DecisionTree::strip_keys`] after extraction.
pub const RESERVED_KEYS: &[&str] = &[UNRESOLVED, "Unresolved", "Other"];

/// Keys that may never appear in a tree, whatever produced it.
pub const UNRESOLVED_KEYS: &[&str] = UNRESOLVED_TOKENS;

/// Returns true if `s` is one of the unresolved marker tokens.
pub fn is_unresolved_token(s: &str) -> bool {
    UNRESOLVED_TOKENS.contains(&s)
}

#[derive(Debug, thiserror::Error)]
pub enum TreeParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object at the root, found {0}")]
    NotAnObject(&'static str),
}

/// Value stored under a tree label.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A nested decision.
    Branch(DecisionTree),
    /// Outcome not yet observed. A key holding this is a frontier node.
    Unresolved,
    /// An observed outcome or action, kept as opaque JSON.
    Resolved(Value),
}

impl Node {
    pub fn resolved(value: impl Into<Value>) -> Self {
        Self::Resolved(value.into())
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    pub fn as_branch(&self) -> Option<&DecisionTree> {
        match self {
            Self::Branch(tree) => Some(tree),
            _ => None,
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Branch(DecisionTree::from_map(map)),
            Value::String(s) if is_unresolved_token(&s) => Self::Unresolved,
            other => Self::Resolved(other),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Branch(tree) => tree.to_value(),
            Self::Unresolved => Value::String(UNRESOLVED.to_string()),
            Self::Resolved(value) => value.clone(),
        }
    }

    fn strip_keys(self, reserved: &[&str]) -> Self {
        match self {
            Self::Branch(tree) => Self::Branch(tree.strip_keys(reserved)),
            Self::Resolved(value) => Self::Resolved(strip_value_keys(value, reserved)),
            Self::Unresolved => Self::Unresolved,
        }
    }
}

/// Insertion-ordered decision tree. Sibling labels are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionTree {
    entries: Vec<(String, Node)>,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tree from JSON text. The root must be an object.
    pub fn parse(text: &str) -> Result<Self, TreeParseError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a tree from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, TreeParseError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(TreeParseError::NotAnObject(value_kind(&other))),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(key, value)| (key, Node::from_value(value)))
                .collect(),
        }
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(key, node)| (key.clone(), node.to_value()))
            .collect();
        Value::Object(map)
    }

    /// Pretty-printed JSON, as embedded in prompts and written to disk.
    pub fn to_pretty_json(&self) -> String {
        // Serializing a Value into a String cannot fail.
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    /// Insert or replace the node under `key`. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = node;
        } else {
            self.entries.push((key, node));
        }
    }

    /// Builder-style insert, handy for assembling trees in code.
    pub fn with(mut self, key: impl Into<String>, node: Node) -> Self {
        self.insert(key, node);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of nested levels. An empty tree has depth 0.
    pub fn depth(&self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        1 + self
            .entries
            .iter()
            .filter_map(|(_, node)| node.as_branch())
            .map(DecisionTree::depth)
            .max()
            .unwrap_or(0)
    }

    /// Remove every key equal to one of `reserved`, at every depth.
    ///
    /// Sibling keys are kept. Objects nested inside resolved leaf values
    /// (e.g. arrays of objects) are cleaned too.
    pub fn strip_keys(self, reserved: &[&str]) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .filter(|(key, _)| !reserved.contains(&key.as_str()))
                .map(|(key, node)| (key, node.strip_keys(reserved)))
                .collect(),
        }
    }
}

fn strip_value_keys(value: Value, reserved: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !reserved.contains(&key.as_str()))
                .map(|(key, v)| (key, strip_value_keys(v, reserved)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| strip_value_keys(v, reserved))
                .collect(),
        ),
        other => other,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Serialize for DecisionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DecisionTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_keeps_insertion_order() {
        let tree = DecisionTree::parse(r#"{"Zeta": "a", "Alpha": "b", "Mid": "c"}"#).unwrap();
        let keys: Vec<&str> = tree.keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn unresolved_tokens_become_tagged_nodes() {
        let tree = DecisionTree::parse(
            r#"{"Billing?": {"Yes": "Unknown", "No": "Unresolved", "Maybe": "Transferred"}}"#,
        )
        .unwrap();
        let billing = tree.get("Billing?").and_then(Node::as_branch).unwrap();
        assert!(billing.get("Yes").unwrap().is_unresolved());
        assert!(billing.get("No").unwrap().is_unresolved());
        assert_eq!(
            billing.get("Maybe"),
            Some(&Node::resolved("Transferred"))
        );
    }

    #[test]
    fn unresolved_serializes_as_canonical_token() {
        let tree = DecisionTree::new().with("Yes", Node::Unresolved);
        assert_eq!(tree.to_value(), json!({"Yes": "Unknown"}));
    }

    #[test]
    fn non_string_leaves_are_opaque() {
        let tree = DecisionTree::parse(r#"{"a": 1, "b": true, "c": ["x"], "d": null}"#).unwrap();
        assert_eq!(tree.get("a"), Some(&Node::resolved(1)));
        assert_eq!(tree.get("b"), Some(&Node::resolved(true)));
        assert_eq!(tree.get("c"), Some(&Node::Resolved(json!(["x"]))));
        assert_eq!(tree.get("d"), Some(&Node::Resolved(Value::Null)));
    }

    #[test]
    fn root_must_be_object() {
        assert!(matches!(
            DecisionTree::parse(r#"["a"]"#),
            Err(TreeParseError::NotAnObject("an array"))
        ));
        assert!(matches!(
            DecisionTree::parse("not json"),
            Err(TreeParseError::Json(_))
        ));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut tree = DecisionTree::new()
            .with("first", Node::Unresolved)
            .with("second", Node::resolved("x"));
        tree.insert("first", Node::resolved("done"));
        let keys: Vec<&str> = tree.keys().collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert_eq!(tree.get("first"), Some(&Node::resolved("done")));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn depth_counts_nested_levels() {
        assert_eq!(DecisionTree::new().depth(), 0);
        let tree = DecisionTree::parse(r#"{"a": {"b": {"c": "x"}}, "d": "y"}"#).unwrap();
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn strip_removes_reserved_keys_at_every_depth() {
        let tree = DecisionTree::parse(
            r#"{
                "Greeting": {
                    "Yes": {"Unknown": "x", "Confirmed": "Done"},
                    "No": "Unknown",
                    "Other": "catch-all"
                },
                "Other": {"deep": "y"},
                "Closing": [{"Unresolved": 1, "kept": 2}]
            }"#,
        )
        .unwrap();

        let cleaned = tree.strip_keys(RESERVED_KEYS);
        assert_eq!(
            cleaned.to_value(),
            json!({
                "Greeting": {
                    "Yes": {"Confirmed": "Done"},
                    "No": "Unknown"
                },
                "Closing": [{"kept": 2}]
            })
        );
    }

    #[test]
    fn serde_roundtrip_through_struct_field() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            tree: DecisionTree,
        }

        let raw = r#"{"tree":{"Q":{"Yes":"Unknown","No":"Hang up"}}}"#;
        let wrapper: Wrapper = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&wrapper).unwrap(), raw);
    }
}
