//! Integration tests for path-addressed access and the error model, driven
//! through the crate's public API.

use form_state::{
    assign_at_path, build_path_map, flatten_errors, get_at_path, has_errors, merge_error_maps,
    parse_path, path, set_at_path, ErrorMap, FieldError, Path, Seg,
};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Write sequences
// ============================================================================

#[test]
fn test_assign_sequence_keeps_tree_free_of_empty_branches() {
    let mut doc = json!({"a": 1, "b": {"c": 3, "d": 4}});

    assert!(assign_at_path(&mut doc, &parse_path("b.c"), None));
    assert_eq!(doc, json!({"a": 1, "b": {"d": 4}}));

    assert!(assign_at_path(&mut doc, &parse_path("b.d"), None));
    assert_eq!(doc, json!({"a": 1}));

    assert!(assign_at_path(&mut doc, &parse_path("b.0.e"), Some(json!(5))));
    assert_eq!(doc, json!({"a": 1, "b": [{"e": 5}]}));

    assert!(assign_at_path(&mut doc, &parse_path("b.0.e"), None));
    assert_eq!(doc, json!({"a": 1}));
}

#[test]
fn test_array_append_then_remove_second_element() {
    let mut doc = json!({"b": [{"x": 1}]});
    set_at_path(&mut doc, &parse_path("b.1"), json!({"y": 2}));
    assert_eq!(doc, json!({"b": [{"x": 1}, {"y": 2}]}));

    assert!(assign_at_path(&mut doc, &parse_path("b.1"), None));
    assert_eq!(doc, json!({"b": [{"x": 1}]}));
}

#[test]
fn test_touched_seed_covers_every_readable_path() {
    let tree = json!({"name": "bill", "friends": [{"name": "bax", "age": 23}]});
    let touched = build_path_map(&tree, true, true);

    for path in touched.keys() {
        assert!(
            get_at_path(&tree, &parse_path(path)).is_some(),
            "{path} should resolve"
        );
    }
    assert_eq!(touched.len(), 5);
}

// ============================================================================
// Error pipeline
// ============================================================================

#[test]
fn test_tree_and_flat_validator_results_merge() {
    let from_schema = flatten_errors(&json!({
        "name": "Required",
        "friends": [null, {"age": ["Too young"]}],
    }));
    let from_rules = ErrorMap::from([
        ("friends.1.age".to_string(), FieldError::from("Not a number")),
        ("surname".to_string(), FieldError::Messages(vec![])),
    ]);

    let merged = merge_error_maps([from_schema, from_rules]);
    assert_eq!(
        merged["friends.1.age"],
        FieldError::from(vec!["Too young", "Not a number"])
    );
    assert_eq!(merged["name"].first(), Some("Required"));
    assert!(has_errors(&merged));

    let only_empty = ErrorMap::from([("surname".to_string(), FieldError::Messages(vec![]))]);
    assert!(!has_errors(&only_empty));
}

// ============================================================================
// Properties
// ============================================================================

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

fn arb_path() -> impl Strategy<Value = Path> {
    let seg = prop_oneof!["[a-z]{1,4}".prop_map(Seg::Key), (0usize..4).prop_map(Seg::Index)];
    prop::collection::vec(seg, 0..5).prop_map(Path::from_segments)
}

proptest! {
    #[test]
    fn prop_get_after_set_returns_value(
        mut doc in arb_value(),
        path in arb_path(),
        value in arb_value(),
    ) {
        set_at_path(&mut doc, &path, value.clone());
        prop_assert_eq!(get_at_path(&doc, &path), Some(&value));
    }

    #[test]
    fn prop_dotted_form_parses_back(path in arb_path()) {
        prop_assert_eq!(parse_path(&path.to_string()), path);
    }

    #[test]
    fn prop_setting_current_value_is_not_a_change(doc in arb_value(), path in arb_path()) {
        let mut copy = doc.clone();
        if let Some(current) = get_at_path(&doc, &path).cloned() {
            prop_assert!(!assign_at_path(&mut copy, &path, Some(current)));
            prop_assert_eq!(copy, doc);
        }
    }
}

#[test]
fn test_path_macro_matches_parser() {
    assert_eq!(path!("friends", 0, "name"), parse_path("friends.0.name"));
}
