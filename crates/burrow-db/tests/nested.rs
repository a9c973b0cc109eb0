mod common;
use common::*;

use bson::doc;
use burrow_query::{bool_query, match_all_query, nested_query, term_query};

// ── Single level ────────────────────────────────────────────────

#[test]
fn simple_nested() {
    let index = single_level_index();
    index
        .index(
            TYPE,
            "1",
            &pair_doc(("n_value1_1", "n_value2_1"), ("n_value1_2", "n_value2_2")),
        )
        .unwrap();
    index.refresh().unwrap();

    assert!(index.get(TYPE, "1").unwrap().is_some());
    assert_eq!(index.status().unwrap().num_docs, 3);

    // _all on the root carries the nested values
    let resp = index.search(&[], &term_query("_all", "n_value1_1")).unwrap();
    assert_eq!(resp.total_hits, 1);

    // nested documents never surface as top-level hits
    let resp = index.search(&[], &match_all_query()).unwrap();
    assert_eq!(resp.total_hits, 1);
    let resp = index
        .search(&[], &term_query("nested1.n_field1", "n_value1_1"))
        .unwrap();
    assert_eq!(resp.total_hits, 0);

    let resp = index
        .search(
            &[],
            &nested_query("nested1", term_query("nested1.n_field1", "n_value1_1")),
        )
        .unwrap();
    assert_eq!(resp.total_hits, 1);
    assert_eq!(resp.ids(), vec!["1"]);

    // values split across two objects of the second document
    index
        .index(
            TYPE,
            "2",
            &pair_doc(("n_value1_1", "n_value2_2"), ("n_value1_2", "n_value2_1")),
        )
        .unwrap();
    index.refresh().unwrap();
    assert_eq!(index.status().unwrap().num_docs, 6);

    let same_object = |path: &str| {
        nested_query(
            path,
            bool_query()
                .must(term_query("nested1.n_field1", "n_value1_1"))
                .must(term_query("nested1.n_field2", "n_value2_1"))
                .build(),
        )
    };
    let resp = index.search(&[], &same_object("nested1")).unwrap();
    assert_eq!(resp.ids(), vec!["1"]);
    let resp = index.search(&[], &same_object("type1.nested1")).unwrap();
    assert_eq!(resp.ids(), vec!["1"]);

    let deleted = index.delete(TYPE, "2").unwrap();
    assert!(deleted.found);
    index.refresh().unwrap();
    assert_eq!(index.status().unwrap().num_docs, 3);

    let resp = index
        .search(
            &[],
            &nested_query("nested1", term_query("nested1.n_field1", "n_value1_1")),
        )
        .unwrap();
    assert_eq!(resp.total_hits, 1);
}

#[test]
fn one_hit_per_parent() {
    let index = single_level_index();
    index
        .index(
            TYPE,
            "1",
            &pair_doc(("same", "a"), ("same", "b")),
        )
        .unwrap();
    index.refresh().unwrap();

    let resp = index
        .search(&[], &nested_query("nested1", term_query("nested1.n_field1", "same")))
        .unwrap();
    assert_eq!(resp.total_hits, 1);
}

// ── Multiple levels ─────────────────────────────────────────────

fn level_query(field1: &str, field2: &str) -> burrow_query::Query {
    nested_query(
        "nested1",
        bool_query()
            .must(term_query("nested1.field1", field1))
            .must(nested_query(
                "nested1.nested2",
                term_query("nested1.nested2.field2", field2),
            ))
            .build(),
    )
}

#[test]
fn multi_nested() {
    let index = two_level_index();
    index
        .index(
            TYPE,
            "1",
            &doc! {
                "field": "value",
                "nested1": [
                    { "field1": "1", "nested2": [{ "field2": "2" }, { "field2": "3" }] },
                    { "field1": "4", "nested2": [{ "field2": "5" }, { "field2": "6" }] },
                ]
            },
        )
        .unwrap();
    index.refresh().unwrap();

    assert!(index.get(TYPE, "1").unwrap().is_some());
    assert_eq!(index.status().unwrap().num_docs, 7);

    let resp = index
        .search(&[], &nested_query("nested1", term_query("nested1.field1", "1")))
        .unwrap();
    assert_eq!(resp.total_hits, 1);

    let resp = index
        .search(
            &[],
            &nested_query("nested1.nested2", term_query("nested1.nested2.field2", "2")),
        )
        .unwrap();
    assert_eq!(resp.total_hits, 1);

    let cases = [
        ("1", "2", 1),
        ("1", "3", 1),
        ("1", "4", 0),
        ("1", "5", 0),
        ("4", "5", 1),
        ("4", "2", 0),
    ];
    for (field1, field2, expected) in cases {
        let resp = index.search(&[], &level_query(field1, field2)).unwrap();
        assert_eq!(
            resp.total_hits, expected,
            "field1={field1} field2={field2}"
        );
    }
}

// ── Query errors ────────────────────────────────────────────────

#[test]
fn bad_nested_path_is_a_query_error() {
    let index = single_level_index();
    index
        .index(TYPE, "1", &doc! { "field1": "value1" })
        .unwrap();
    index.refresh().unwrap();

    let err = index
        .search(&[], &nested_query("nested9", match_all_query()))
        .unwrap_err();
    assert!(err.is_query_error());
    assert_eq!(
        err.to_string(),
        "[nested] failed to find nested object under path [nested9]"
    );

    let err = index
        .search(&[], &nested_query("field1", match_all_query()))
        .unwrap_err();
    assert!(err.is_query_error());

    let err = index.search(&["type9"], &match_all_query()).unwrap_err();
    assert!(matches!(err, burrow_db::DbError::TypeNotFound(ref t) if t == "type9"));
}

#[test]
fn nesting_deeper_than_the_limit_is_rejected() {
    let index = temp_index_with(burrow_db::IndexConfig {
        max_nested_depth: 1,
        ..burrow_db::IndexConfig::default()
    });
    index
        .put_mapping(TYPE, &doc! { "properties": { "nested1": { "type": "nested" } } })
        .unwrap();

    let one = nested_query("nested1", match_all_query());
    assert_eq!(index.search(&[], &one).unwrap().total_hits, 0);

    let two = nested_query(
        "nested1",
        nested_query("nested1.nested2", match_all_query()),
    );
    let err = index.search(&[], &two).unwrap_err();
    assert!(err.is_query_error());
    assert!(err.to_string().contains("limit is 1"));
}
