//! Property-based tests using proptest
//!
//! These tests verify relation normalization, unique-lookup selection and
//! API path derivation using randomized inputs.

use infractl::resource::{
    normalize_record, normalize_relation, select_unique, Direction, ListEnvelope, RelationField,
    RelationShape, ResourceDescriptor,
};
use infractl::ClientError;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// A related object as the service embeds it: id plus display fields
fn arb_nested(id: u32) -> impl Strategy<Value = Value> {
    ("[a-z][a-z0-9-]{0,20}", "[a-z]{3,8}").prop_map(move |(name, slug)| {
        json!({
            "id": id,
            "name": name,
            "slug": slug,
            "url": format!("http://sp/api/virtualization/things/{}/", id)
        })
    })
}

/// A relation value in any accepted input form
fn arb_relation() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<u32>().prop_map(|id| json!(id)),
        any::<u32>().prop_flat_map(arb_nested),
        prop::collection::vec(any::<u32>(), 0..5).prop_map(|ids| json!(ids)),
        prop::collection::vec(any::<u32>().prop_flat_map(arb_nested), 0..5).prop_map(Value::Array),
    ]
}

fn arb_shape() -> impl Strategy<Value = RelationShape> {
    prop_oneof![Just(RelationShape::Id), Just(RelationShape::Nested)]
}

/// Collapse a relation to the ids it refers to, whatever its form
fn referenced_ids(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => vec![],
        Value::Array(items) => items.iter().flat_map(referenced_ids).collect(),
        Value::Object(map) => map.get("id").cloned().into_iter().collect(),
        scalar => vec![scalar.clone()],
    }
}

proptest! {
    /// Normalizing twice gives the same result as normalizing once
    #[test]
    fn test_normalization_is_idempotent(value in arb_relation(), shape in arb_shape()) {
        let once = normalize_relation(value, shape);
        let twice = normalize_relation(once.clone(), shape);
        prop_assert_eq!(once, twice);
    }

    /// Normalization never changes which objects a relation refers to
    #[test]
    fn test_normalization_preserves_references(value in arb_relation(), shape in arb_shape()) {
        let before = referenced_ids(&value);
        let after = referenced_ids(&normalize_relation(value, shape));
        prop_assert_eq!(before, after);
    }

    /// A bare id and the nested record for it normalize identically
    #[test]
    fn test_id_and_nested_forms_agree(nested in any::<u32>().prop_flat_map(arb_nested), shape in arb_shape()) {
        let id = nested["id"].clone();
        let from_nested = normalize_relation(nested, shape);
        let from_id = normalize_relation(id, shape);
        match shape {
            RelationShape::Id => prop_assert_eq!(from_nested, from_id),
            RelationShape::Nested => prop_assert_eq!(&from_nested["id"], &from_id["id"]),
        }
    }

    /// Inbound normalization of a created record equals that of the fetched record
    #[test]
    fn test_create_then_get_records_compare_equal(
        id in any::<u32>(),
        name in "[a-z][a-z0-9-]{0,30}",
        type_id in any::<u32>(),
        site_id in proptest::option::of(any::<u32>()),
    ) {
        let fields = vec![RelationField::new("type"), RelationField::new("site")];

        // The create response embeds related objects, a later get may not
        let created: Map<String, Value> = json!({
            "id": id,
            "name": name,
            "type": {"id": type_id, "name": "openstack"},
            "site": site_id.map(|s| json!({"id": s, "slug": "dc"})),
        })
        .as_object()
        .cloned()
        .unwrap();
        let fetched: Map<String, Value> = json!({
            "id": id,
            "name": name,
            "type": type_id,
            "site": site_id,
        })
        .as_object()
        .cloned()
        .unwrap();

        prop_assert_eq!(
            normalize_record(created, &fields, Direction::Inbound),
            normalize_record(fetched, &fields, Direction::Inbound)
        );
    }

    /// Undeclared fields pass through untouched
    #[test]
    fn test_undeclared_fields_untouched(value in arb_relation()) {
        let mut record = Map::new();
        record.insert("custom_fields".to_string(), value.clone());
        let normalized = normalize_record(record, &[RelationField::new("type")], Direction::Inbound);
        prop_assert_eq!(&normalized["custom_fields"], &value);
    }

    /// Unique selection: none for zero, the record for one, ambiguity above
    #[test]
    fn test_unique_selection_by_count(count in 0u64..6, value in "[a-z]{1,10}") {
        let results: Vec<Value> = (0..count)
            .map(|i| json!({"id": i, "name": value}))
            .collect();
        let envelope = ListEnvelope {
            count,
            next: None,
            previous: None,
            results,
        };

        match (count, select_unique(envelope, "name", &value, "http://sp/api/x/")) {
            (0, Ok(None)) => {}
            (1, Ok(Some(record))) => prop_assert_eq!(&record["name"], &json!(value)),
            (n, Err(ClientError::AmbiguousMatch { count, .. })) if n > 1 => prop_assert_eq!(count, n),
            (n, other) => prop_assert!(false, "unexpected result for {} matches: {:?}", n, other),
        }
    }

    /// Only the final segment's underscores become hyphens
    #[test]
    fn test_api_path_derivation(
        group in "[a-z]{2,10}",
        words in prop::collection::vec("[a-z]{2,8}", 1..4),
    ) {
        let collection = words.join("_");
        let descriptor = ResourceDescriptor::new(&format!("{}.{}", group, collection), "Things");
        prop_assert_eq!(
            descriptor.api_path(),
            format!("api/{}/{}", group, words.join("-"))
        );
    }
}
