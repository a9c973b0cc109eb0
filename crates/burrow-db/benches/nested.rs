use bson::{Document, doc};
use burrow_db::{Index, IndexConfig};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use burrow_query::*;
use burrow_store::MemoryStore;

const STATUSES: [&str; 3] = ["active", "pending", "closed"];

fn order(i: usize) -> Document {
    let lines: Vec<_> = (0..4)
        .map(|j| {
            doc! {
                "sku": format!("sku-{}", (i + j) % 50),
                "qty": ((i * 7 + j) % 10) as i64,
                "notes": [{ "tag": STATUSES[(i + j) % 3] }],
            }
        })
        .collect();
    doc! {
        "customer": format!("c{}", i % 100),
        "status": STATUSES[i % 3],
        "lines": lines,
    }
}

fn seeded_index(n: usize) -> Index<MemoryStore> {
    let index = Index::open(MemoryStore::new(), IndexConfig::default()).unwrap();
    index
        .put_mapping(
            "order",
            &doc! {
                "properties": {
                    "lines": {
                        "type": "nested",
                        "properties": { "notes": { "type": "nested" } }
                    }
                }
            },
        )
        .unwrap();
    for i in 0..n {
        index.index("order", &i.to_string(), &order(i)).unwrap();
    }
    index.refresh().unwrap();
    index
}

// ── Indexing ────────────────────────────────────────────────

fn bench_index_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_block");
    let index = seeded_index(0);
    let doc = order(1);
    group.bench_function("replace", |b| {
        b.iter(|| index.index("order", "1", &doc).unwrap())
    });
    group.finish();
}

// ── Queries ─────────────────────────────────────────────────

fn bench_query_root_term(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_root_term");
    for n in [1_000, 10_000] {
        let index = seeded_index(n);
        let query = term_query("status", "active");
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| index.search(&[], &query).unwrap().total_hits)
        });
    }
    group.finish();
}

fn bench_query_nested_same_instance(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_nested_same_instance");
    for n in [1_000, 10_000] {
        let index = seeded_index(n);
        let query = nested_query(
            "lines",
            bool_query()
                .must(term_query("lines.sku", "sku-3"))
                .must(range_query("lines.qty", RangeBounds::default().gte(5)))
                .build(),
        );
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| index.search(&[], &query).unwrap().total_hits)
        });
    }
    group.finish();
}

fn bench_query_two_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_two_levels");
    for n in [1_000, 10_000] {
        let index = seeded_index(n);
        let query = nested_query(
            "lines",
            bool_query()
                .must(term_query("lines.sku", "sku-3"))
                .must(nested_query(
                    "lines.notes",
                    term_query("lines.notes.tag", "closed"),
                ))
                .build(),
        );
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| index.search(&[], &query).unwrap().total_hits)
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_index_block,
    bench_query_root_term,
    bench_query_nested_same_instance,
    bench_query_two_levels,
);
criterion_main!(benches);
