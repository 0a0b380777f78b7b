//! Field errors and their aggregation.
//!
//! A field's error is absent (`None`), a single message, or an ordered list of
//! messages. Errors are kept in flat maps keyed by dotted path; validators may
//! return either such a flat map or a nested tree mirroring the value tree,
//! and both normalize into the same [`ErrorMap`].

use crate::Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat mapping from dotted path to field error.
pub type ErrorMap = BTreeMap<String, FieldError>;

/// Flat mapping from dotted path to touched flag.
pub type TouchedMap = BTreeMap<String, bool>;

/// A present field error: one message or a list of messages.
///
/// Serializes as a bare string or an array of strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldError {
    Message(String),
    Messages(Vec<String>),
}

impl FieldError {
    /// The first message, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldError::Message(m) => Some(m),
            FieldError::Messages(list) => list.first().map(String::as_str),
        }
    }

    /// All messages in order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            FieldError::Message(m) => vec![m.clone()],
            FieldError::Messages(list) => list.clone(),
        }
    }

    /// Whether this is a list with no messages.
    #[inline]
    pub fn is_empty_list(&self) -> bool {
        matches!(self, FieldError::Messages(list) if list.is_empty())
    }

    fn into_messages(self) -> Vec<String> {
        match self {
            FieldError::Message(m) => vec![m],
            FieldError::Messages(list) => list,
        }
    }
}

impl From<&str> for FieldError {
    fn from(m: &str) -> Self {
        FieldError::Message(m.to_owned())
    }
}

impl From<String> for FieldError {
    fn from(m: String) -> Self {
        FieldError::Message(m)
    }
}

impl From<Vec<String>> for FieldError {
    fn from(list: Vec<String>) -> Self {
        FieldError::Messages(list)
    }
}

impl From<Vec<&str>> for FieldError {
    fn from(list: Vec<&str>) -> Self {
        FieldError::Messages(list.into_iter().map(str::to_owned).collect())
    }
}

/// Whether an error signifies a problem.
///
/// Absent, an empty string and an empty list are not errors. Any non-empty
/// list is, whatever its contents.
pub fn is_error(error: Option<&FieldError>) -> bool {
    match error {
        None => false,
        Some(FieldError::Message(m)) => !m.is_empty(),
        Some(FieldError::Messages(list)) => !list.is_empty(),
    }
}

/// Whether any entry of the map is an error.
pub fn has_errors(errors: &ErrorMap) -> bool {
    errors.values().any(|e| is_error(Some(e)))
}

/// Merge field errors left to right.
///
/// Absent entries are skipped. Once two present errors meet, the result is a
/// list holding the messages in argument order.
///
/// ```
/// use form_state::{merge_field_errors, FieldError};
///
/// let merged = merge_field_errors([Some("A".into()), None, Some("B".into())]);
/// assert_eq!(merged, Some(FieldError::from(vec!["A", "B"])));
/// ```
pub fn merge_field_errors<I>(errors: I) -> Option<FieldError>
where
    I: IntoIterator<Item = Option<FieldError>>,
{
    errors.into_iter().fold(None, |acc, next| match (acc, next) {
        (acc, None) => acc,
        (None, next) => next,
        (Some(acc), Some(next)) => {
            let mut list = acc.into_messages();
            list.extend(next.into_messages());
            Some(FieldError::Messages(list))
        }
    })
}

/// Merge flat error maps path by path, in map order.
pub fn merge_error_maps<I>(maps: I) -> ErrorMap
where
    I: IntoIterator<Item = ErrorMap>,
{
    let mut merged = ErrorMap::new();
    for map in maps {
        for (path, error) in map {
            merge_into(&mut merged, path, error);
        }
    }
    merged
}

fn merge_into(map: &mut ErrorMap, path: String, error: FieldError) {
    let existing = map.remove(&path);
    if let Some(merged) = merge_field_errors([existing, Some(error)]) {
        map.insert(path, merged);
    }
}

/// Flatten a nested error tree into a flat map.
///
/// Strings become single messages and arrays holding only strings become
/// message lists. Records recurse by key and arrays holding anything else
/// recurse by index. `null` means no error. Keys may already be dotted paths;
/// they are joined as-is, so `{"a": {"b": "x"}}` and `{"a.b": "x"}` land on
/// the same entry (and merge when both appear).
///
/// ```
/// use form_state::{flatten_errors, FieldError};
/// use serde_json::json;
///
/// let flat = flatten_errors(&json!({
///     "name": "Required",
///     "friends": [{"age": ["Too young", "Not a number"]}],
/// }));
/// assert_eq!(flat["name"], FieldError::from("Required"));
/// assert_eq!(flat["friends.0.age"].messages().len(), 2);
/// ```
pub fn flatten_errors(tree: &Value) -> ErrorMap {
    let mut out = ErrorMap::new();
    flatten_into(tree, &mut Path::root(), &mut out);
    out
}

fn flatten_into(node: &Value, prefix: &mut Path, out: &mut ErrorMap) {
    match node {
        Value::Null => {}
        Value::String(m) => merge_into(out, prefix.to_string(), FieldError::Message(m.clone())),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            let list = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
            merge_into(out, prefix.to_string(), FieldError::Messages(list));
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                prefix.push(i.into());
                flatten_into(item, prefix, out);
                prefix.pop();
            }
        }
        Value::Object(obj) => {
            for (key, child) in obj {
                prefix.push(key.as_str().into());
                flatten_into(child, prefix, out);
                prefix.pop();
            }
        }
        other => {
            tracing::debug!(path = %prefix, value = %other, "ignoring non-message error leaf");
        }
    }
}

/// What a validator produced: a nested error tree or an already flat map.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationOutput {
    Tree(Value),
    Flat(ErrorMap),
}

impl ValidationOutput {
    /// Normalize into a flat error map.
    pub fn into_error_map(self) -> ErrorMap {
        match self {
            ValidationOutput::Tree(tree) => flatten_errors(&tree),
            ValidationOutput::Flat(map) => map,
        }
    }
}

impl Default for ValidationOutput {
    fn default() -> Self {
        ValidationOutput::Flat(ErrorMap::new())
    }
}

impl From<Value> for ValidationOutput {
    fn from(tree: Value) -> Self {
        ValidationOutput::Tree(tree)
    }
}

impl From<ErrorMap> for ValidationOutput {
    fn from(map: ErrorMap) -> Self {
        ValidationOutput::Flat(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(m: &str) -> Option<FieldError> {
        Some(FieldError::from(m))
    }

    fn list(items: &[&str]) -> Option<FieldError> {
        Some(FieldError::from(items.to_vec()))
    }

    #[test]
    fn test_merge_two_messages_promotes_to_list() {
        assert_eq!(merge_field_errors([msg("A"), msg("B")]), list(&["A", "B"]));
    }

    #[test]
    fn test_merge_absent_is_identity() {
        assert_eq!(merge_field_errors([None, msg("X")]), msg("X"));
        assert_eq!(merge_field_errors([msg("X"), None]), msg("X"));
        assert_eq!(merge_field_errors([None, list(&["X"])]), list(&["X"]));
        assert_eq!(merge_field_errors([None, None]), None);
        assert_eq!(merge_field_errors(Vec::new()), None);
    }

    #[test]
    fn test_merge_empty_lists_stays_empty_list() {
        assert_eq!(merge_field_errors([list(&[]), list(&[])]), list(&[]));
    }

    #[test]
    fn test_merge_list_concatenates() {
        assert_eq!(
            merge_field_errors([list(&["A"]), msg("B"), list(&["C", "D"])]),
            list(&["A", "B", "C", "D"])
        );
        assert_eq!(
            merge_field_errors([msg("A"), list(&["B", "C"])]),
            list(&["A", "B", "C"])
        );
    }

    #[test]
    fn test_is_error() {
        assert!(!is_error(None));
        assert!(!is_error(msg("").as_ref()));
        assert!(!is_error(list(&[]).as_ref()));
        assert!(is_error(msg("x").as_ref()));
        assert!(is_error(list(&["x"]).as_ref()));
        assert!(is_error(list(&["", "y"]).as_ref()));
        assert!(is_error(list(&[""]).as_ref()));
    }

    #[test]
    fn test_has_errors() {
        let mut map = ErrorMap::new();
        assert!(!has_errors(&map));
        map.insert("a".into(), FieldError::from(""));
        map.insert("b".into(), FieldError::Messages(vec![]));
        assert!(!has_errors(&map));
        map.insert("c".into(), FieldError::from("bad"));
        assert!(has_errors(&map));
    }

    #[test]
    fn test_merge_error_maps_in_order() {
        let first = ErrorMap::from([
            ("name".to_string(), FieldError::from("Required")),
            ("age".to_string(), FieldError::from("Too young")),
        ]);
        let second = ErrorMap::from([("name".to_string(), FieldError::from("Too short"))]);

        let merged = merge_error_maps([first, second]);
        assert_eq!(merged["name"], FieldError::from(vec!["Required", "Too short"]));
        assert_eq!(merged["age"], FieldError::from("Too young"));
    }

    #[test]
    fn test_flatten_nested_tree() {
        let flat = flatten_errors(&json!({
            "name": "Required",
            "preferences": {"color": "Not a nice color"},
            "friends": [null, {"name": ["Too short"]}],
        }));
        assert_eq!(flat.len(), 3);
        assert_eq!(flat["preferences.color"], FieldError::from("Not a nice color"));
        assert_eq!(flat["friends.1.name"], FieldError::from(vec!["Too short"]));
    }

    #[test]
    fn test_flatten_accepts_dotted_keys() {
        let nested = flatten_errors(&json!({"friends": [{"name": "x"}]}));
        let dotted = flatten_errors(&json!({"friends.0.name": "x"}));
        assert_eq!(nested, dotted);
    }

    #[test]
    fn test_flatten_merges_both_shapes() {
        let flat = flatten_errors(&json!({"a": {"b": "nested"}, "a.b": "dotted"}));
        assert_eq!(flat["a.b"], FieldError::from(vec!["nested", "dotted"]));
    }

    #[test]
    fn test_flatten_keeps_empty_list() {
        let flat = flatten_errors(&json!({"tags": []}));
        assert_eq!(flat["tags"], FieldError::Messages(vec![]));
    }

    #[test]
    fn test_flatten_ignores_non_message_scalars() {
        let flat = flatten_errors(&json!({"a": 1, "b": true, "c": null}));
        assert!(flat.is_empty());
    }

    #[test]
    fn test_field_error_serde_shape() {
        let single: FieldError = serde_json::from_value(json!("x")).unwrap();
        assert_eq!(single, FieldError::from("x"));
        let many: FieldError = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(serde_json::to_value(&many).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_validation_output_normalizes() {
        let tree = ValidationOutput::from(json!({"a": {"b": "x"}}));
        let flat = ValidationOutput::from(ErrorMap::from([(
            "a.b".to_string(),
            FieldError::from("x"),
        )]));
        assert_eq!(tree.into_error_map(), flat.into_error_map());
    }
}
