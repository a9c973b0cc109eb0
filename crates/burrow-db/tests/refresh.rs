mod common;
use common::*;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bson::doc;
use burrow_db::IndexConfig;
use burrow_query::match_all_query;

#[test]
fn writes_are_invisible_to_search_until_refresh() {
    let index = single_level_index();
    index.index(TYPE, "1", &doc! { "field1": "value1" }).unwrap();

    assert_eq!(index.search(&[], &match_all_query()).unwrap().total_hits, 0);
    assert_eq!(index.status().unwrap().num_docs, 0);
    // get reads the latest committed state
    assert!(index.get(TYPE, "1").unwrap().is_some());

    index.refresh().unwrap();
    assert_eq!(index.search(&[], &match_all_query()).unwrap().total_hits, 1);
    assert_eq!(index.status().unwrap().num_docs, 1);
}

#[test]
fn refresh_without_writes_keeps_the_sequence() {
    let index = single_level_index();
    index.index(TYPE, "1", &doc! { "field1": "value1" }).unwrap();
    let first = index.refresh().unwrap();
    let second = index.refresh().unwrap();
    assert_eq!(first, second);
    assert_eq!(index.status().unwrap().snapshot_sequence, first);
}

#[test]
fn refresh_on_write_publishes_immediately() {
    let index = temp_index_with(IndexConfig {
        refresh_on_write: true,
        ..IndexConfig::default()
    });
    index.put_mapping(TYPE, &doc! {}).unwrap();
    index.index(TYPE, "1", &doc! { "field1": "value1" }).unwrap();
    assert_eq!(index.search(&[], &match_all_query()).unwrap().total_hits, 1);

    index.delete(TYPE, "1").unwrap();
    assert_eq!(index.search(&[], &match_all_query()).unwrap().total_hits, 0);
}

#[test]
fn background_refresh_publishes_writes() {
    let mut index = temp_index_with(IndexConfig {
        refresh_interval_ms: Some(10),
        ..IndexConfig::default()
    });
    index.put_mapping(TYPE, &doc! {}).unwrap();
    index.index(TYPE, "1", &doc! { "field1": "value1" }).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let hits = index.search(&[], &match_all_query()).unwrap().total_hits;
        if hits == 1 {
            break;
        }
        assert!(Instant::now() < deadline, "background refresh never ran");
        thread::sleep(Duration::from_millis(5));
    }

    index.shutdown();
    index.index(TYPE, "2", &doc! { "field1": "value2" }).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(index.search(&[], &match_all_query()).unwrap().total_hits, 1);
}

#[test]
fn concurrent_refreshes_never_unpublish_a_write() {
    let index = temp_index_with(IndexConfig {
        refresh_on_write: true,
        ..IndexConfig::default()
    });
    index.put_mapping(TYPE, &doc! {}).unwrap();

    let done = AtomicBool::new(false);
    let regressions = AtomicU64::new(0);
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::Relaxed) {
                    index.refresh().unwrap();
                }
            });
        }
        for i in 0..300u64 {
            index
                .index(TYPE, &i.to_string(), &doc! { "n": i as i64 })
                .unwrap();
            let hits = index.search(&[], &match_all_query()).unwrap().total_hits;
            if hits < i + 1 {
                regressions.fetch_add(1, Ordering::Relaxed);
            }
        }
        done.store(true, Ordering::Relaxed);
    });

    assert_eq!(regressions.load(Ordering::Relaxed), 0);
    assert_eq!(index.status().unwrap().num_docs, 300);
}

#[test]
fn refresh_sequence_is_monotonic() {
    let index = single_level_index();
    let mut last = index.refresh().unwrap();
    for i in 0..5 {
        index
            .index(TYPE, &i.to_string(), &doc! { "field1": "value1" })
            .unwrap();
        let sequence = index.refresh().unwrap();
        assert!(sequence > last);
        last = sequence;
    }
    assert_eq!(index.status().unwrap().snapshot_sequence, last);
}
