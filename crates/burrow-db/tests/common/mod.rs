use bson::{Document, doc};
use burrow_db::{Index, IndexConfig};
use burrow_store::MemoryStore;

pub const TYPE: &str = "type1";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn temp_index() -> Index<MemoryStore> {
    temp_index_with(IndexConfig::default())
}

pub fn temp_index_with(config: IndexConfig) -> Index<MemoryStore> {
    init_tracing();
    Index::open(MemoryStore::new(), config).unwrap()
}

/// `type1` with a single nested field, `nested1`.
pub fn single_level_index() -> Index<MemoryStore> {
    let index = temp_index();
    index
        .put_mapping(
            TYPE,
            &doc! { "type1": { "properties": { "nested1": { "type": "nested" } } } },
        )
        .unwrap();
    index
}

/// `type1` with `nested1`, which itself holds `nested2`.
pub fn two_level_index() -> Index<MemoryStore> {
    let index = temp_index();
    index
        .put_mapping(
            TYPE,
            &doc! {
                "type1": {
                    "properties": {
                        "nested1": {
                            "type": "nested",
                            "properties": { "nested2": { "type": "nested" } }
                        }
                    }
                }
            },
        )
        .unwrap();
    index
}

/// A root with two `nested1` objects.
pub fn pair_doc(first: (&str, &str), second: (&str, &str)) -> Document {
    doc! {
        "field1": "value1",
        "nested1": [
            { "n_field1": first.0, "n_field2": first.1 },
            { "n_field1": second.0, "n_field2": second.1 },
        ]
    }
}
