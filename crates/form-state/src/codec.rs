//! Path-addressed reads and writes on a value tree.
//!
//! All functions operate on a tree the caller owns and keep no references
//! past the call. Reads fail closed: a missing key, an out-of-range index or
//! a scalar in the middle of the path all yield `None`.
//!
//! Deleting a value prunes every container that the deletion left empty, from
//! the deepest one upward, stopping below the root. Writing through a scalar
//! replaces it with the container the next segment implies.
//!
//! Writes that would grow a sequence to an index above
//! [`MAX_SEQUENCE_INDEX`] are refused and leave the tree unchanged.

use crate::{Path, Seg};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Get a reference to the value at a path.
///
/// An index segment that lands on a record looks up the key spelled by the
/// index, so `"0"` keys stay reachable.
///
/// # Examples
///
/// ```
/// use form_state::{get_at_path, path};
/// use serde_json::json;
///
/// let doc = json!({"friends": [{"name": "bax"}]});
/// assert_eq!(get_at_path(&doc, &path!("friends", 0, "name")), Some(&json!("bax")));
/// assert_eq!(get_at_path(&doc, &path!("friends", 3)), None);
/// ```
pub fn get_at_path<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    path.iter().try_fold(doc, |current, seg| match (current, seg) {
        (Value::Array(arr), Seg::Index(idx)) => arr.get(*idx),
        (Value::Object(obj), Seg::Key(key)) => obj.get(key),
        (Value::Object(obj), Seg::Index(idx)) => obj.get(&idx.to_string()),
        _ => None,
    })
}

/// Highest index a write may extend a sequence to.
pub const MAX_SEQUENCE_INDEX: usize = 1 << 16;

/// Set a value at a path, creating intermediate containers as needed.
///
/// A missing intermediate becomes a sequence when the following segment is
/// an index and a record otherwise. Writing past the end of a sequence pads
/// it with `null`. Returns `false`, changing nothing, when the write would
/// need a sequence index above [`MAX_SEQUENCE_INDEX`].
pub fn set_at_path(doc: &mut Value, path: &Path, value: Value) -> bool {
    if exceeds_sequence_limit(doc, path.segments()) {
        tracing::debug!(path = %path, "write refused, sequence index too large");
        return false;
    }
    set_in(doc, path.segments(), value);
    true
}

/// Whether writing along `segments` would grow a sequence past the limit.
fn exceeds_sequence_limit(doc: &Value, segments: &[Seg]) -> bool {
    let mut current = Some(doc);
    for seg in segments {
        match (current, seg) {
            (Some(Value::Object(obj)), seg) => current = obj.get(&seg.record_key()),
            (Some(Value::Array(arr)), Seg::Index(idx)) => {
                if *idx >= arr.len() && *idx > MAX_SEQUENCE_INDEX {
                    return true;
                }
                current = arr.get(*idx);
            }
            // Missing or overwritten from here on: new sequences get created.
            (_, Seg::Index(idx)) if *idx > MAX_SEQUENCE_INDEX => return true,
            _ => current = None,
        }
    }
    false
}

fn set_in(current: &mut Value, segments: &[Seg], value: Value) {
    match segments {
        [] => *current = value,
        [seg, rest @ ..] => set_in(slot_mut(current, seg), rest, value),
    }
}

/// Get the child slot for `seg`, converting `current` into a fitting
/// container first when it is not one.
fn slot_mut<'a>(current: &'a mut Value, seg: &Seg) -> &'a mut Value {
    match (current, seg) {
        (Value::Array(arr), Seg::Index(idx)) => {
            if arr.len() <= *idx {
                arr.resize(*idx + 1, Value::Null);
            }
            &mut arr[*idx]
        }
        (Value::Object(obj), seg) => obj.entry(seg.record_key()).or_insert(Value::Null),
        (other, seg) => {
            *other = match seg {
                Seg::Index(_) => Value::Array(Vec::new()),
                Seg::Key(_) => Value::Object(Map::new()),
            };
            slot_mut(other, seg)
        }
    }
}

/// Delete the value at a path.
///
/// Sequence elements after the removed one shift left. Containers that the
/// removal left empty are removed from their parents, recursively; the root
/// itself is never removed. Returns `false` (and changes nothing) when the
/// path does not exist or is the root.
///
/// # Examples
///
/// ```
/// use form_state::{delete_at_path, path};
/// use serde_json::json;
///
/// let mut doc = json!({"a": 1, "b": {"c": 3}});
/// assert!(delete_at_path(&mut doc, &path!("b", "c")));
/// assert_eq!(doc, json!({"a": 1}));
/// ```
pub fn delete_at_path(doc: &mut Value, path: &Path) -> bool {
    delete_in(doc, path.segments())
}

fn delete_in(current: &mut Value, segments: &[Seg]) -> bool {
    match segments {
        [] => false,
        [leaf] => remove_child(current, leaf).is_some(),
        [head, rest @ ..] => {
            let Some(child) = child_mut(current, head) else {
                return false;
            };
            if !delete_in(child, rest) {
                return false;
            }
            let emptied = is_empty_container(child);
            if emptied {
                remove_child(current, head);
            }
            true
        }
    }
}

fn child_mut<'a>(current: &'a mut Value, seg: &Seg) -> Option<&'a mut Value> {
    match (current, seg) {
        (Value::Array(arr), Seg::Index(idx)) => arr.get_mut(*idx),
        (Value::Object(obj), seg) => obj.get_mut(&seg.record_key()),
        _ => None,
    }
}

fn remove_child(current: &mut Value, seg: &Seg) -> Option<Value> {
    match (current, seg) {
        (Value::Array(arr), Seg::Index(idx)) if *idx < arr.len() => Some(arr.remove(*idx)),
        (Value::Object(obj), seg) => obj.remove(&seg.record_key()),
        _ => None,
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(arr) => arr.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

/// Set (`Some`) or delete (`None`) the value at a path.
///
/// Returns whether the tree changed; a refused write reports `false`.
pub fn assign_at_path(doc: &mut Value, path: &Path, value: Option<Value>) -> bool {
    match value {
        Some(value) => {
            if get_at_path(doc, path) == Some(&value) {
                return false;
            }
            set_at_path(doc, path, value)
        }
        None => delete_at_path(doc, path),
    }
}

/// Map every reachable path in `tree` to `value`.
///
/// With `recursive` set, nested records and sequences contribute their own
/// paths (`"friends"`, `"friends.0"`, `"friends.0.name"`, ...). Otherwise only
/// top-level entries are listed. A scalar root yields an empty map.
///
/// # Examples
///
/// ```
/// use form_state::build_path_map;
/// use serde_json::json;
///
/// let touched = build_path_map(&json!({"a": {"b": 1}}), true, true);
/// assert_eq!(touched.len(), 2);
/// assert_eq!(touched["a.b"], true);
/// ```
pub fn build_path_map<T: Clone>(tree: &Value, value: T, recursive: bool) -> BTreeMap<String, T> {
    let mut out = BTreeMap::new();
    let mut prefix = Path::root();
    collect_paths(tree, &mut prefix, &value, recursive, &mut out);
    out
}

fn collect_paths<T: Clone>(
    node: &Value,
    prefix: &mut Path,
    value: &T,
    recursive: bool,
    out: &mut BTreeMap<String, T>,
) {
    let children: Vec<(Seg, &Value)> = match node {
        Value::Object(obj) => obj.iter().map(|(k, v)| (Seg::Key(k.clone()), v)).collect(),
        Value::Array(arr) => arr.iter().enumerate().map(|(i, v)| (Seg::Index(i), v)).collect(),
        _ => return,
    };

    for (seg, child) in children {
        prefix.push(seg);
        out.insert(prefix.to_string(), value.clone());
        if recursive {
            collect_paths(child, prefix, value, recursive, out);
        }
        prefix.pop();
    }
}
