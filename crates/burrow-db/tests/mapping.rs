mod common;
use common::*;

use bson::doc;
use burrow_db::{DbError, IndexConfig, Mapping, SchemaNode};
use burrow_engine::EngineError;

#[test]
fn registering_the_same_mapping_twice_is_a_no_op() {
    let index = single_level_index();
    index
        .put_mapping(TYPE, &doc! { "properties": { "nested1": { "type": "nested" } } })
        .unwrap();
    let mapping = index.mapping(TYPE).unwrap().unwrap();
    assert_eq!(mapping.nested_paths(), vec!["nested1".to_string()]);
}

#[test]
fn a_different_mapping_conflicts() {
    let index = single_level_index();
    let err = index
        .put_mapping(TYPE, &doc! { "properties": { "nested2": { "type": "nested" } } })
        .unwrap_err();
    assert!(matches!(err, DbError::MappingConflict(ref t) if t == TYPE));
}

#[test]
fn mappings_deeper_than_the_limit_are_rejected() {
    let index = temp_index_with(IndexConfig {
        max_nested_depth: 1,
        ..IndexConfig::default()
    });
    let deep = Mapping::new(
        TYPE,
        vec![SchemaNode::nested("a").with_child(SchemaNode::nested("b"))],
    );
    let err = index.register(deep).unwrap_err();
    assert!(matches!(err, DbError::Engine(EngineError::InvalidMapping(_))));
    assert!(index.mapping(TYPE).unwrap().is_none());
}

#[test]
fn invalid_type_names_are_rejected() {
    let index = temp_index();
    for name in ["", "a.b"] {
        let err = index.put_mapping(name, &doc! {}).unwrap_err();
        assert!(matches!(err, DbError::Engine(EngineError::InvalidMapping(_))));
    }
}

#[test]
fn writes_to_unknown_types_fail() {
    let index = temp_index();
    let err = index.index("type9", "1", &doc! {}).unwrap_err();
    assert!(matches!(err, DbError::TypeNotFound(ref t) if t == "type9"));
    assert!(matches!(
        index.get("type9", "1"),
        Err(DbError::TypeNotFound(_))
    ));
}

#[test]
fn empty_ids_are_rejected() {
    let index = single_level_index();
    let err = index.index(TYPE, "", &doc! {}).unwrap_err();
    assert!(matches!(err, DbError::InvalidId(_)));
}
