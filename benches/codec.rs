//! Benchmarks for document encoding, decoding and query building.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quickdb::codec;
use quickdb::document::{from_bson_document, to_bson_document};
use quickdb::prelude::*;

#[derive(Debug, Clone, Default, Document)]
struct LineItem {
    id: DocumentId,
    sku: String,
    quantity: i32,
    price: f64,
}

#[derive(Debug, Clone, Default, Document)]
#[quickdb(collection = "orders")]
struct Order {
    id: DocumentId,
    customer: String,
    paid: bool,
    tags: Vec<String>,
    items: Vec<LineItem>,
}

/// Create an order with `count` line items.
fn create_order(count: usize) -> Order {
    Order {
        customer: "customer@example.com".into(),
        paid: true,
        tags: vec!["priority".into(), "gift".into()],
        items: (0..count)
            .map(|i| LineItem {
                sku: format!("SKU-{:05}", i),
                quantity: (i % 7) as i32 + 1,
                price: 9.99 + i as f64,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for size in [1, 10, 100].iter() {
        let order = create_order(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("to_fields", size), &order, |b, order| {
            b.iter(|| black_box(order.to_fields()))
        });

        group.bench_with_input(BenchmarkId::new("to_bson", size), &order, |b, order| {
            b.iter(|| black_box(to_bson_document(order)))
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [1, 10, 100].iter() {
        let stored = to_bson_document(&create_order(*size));
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(
            BenchmarkId::new("decode_document", size),
            &stored,
            |b, stored| b.iter(|| black_box(codec::decode_document(stored))),
        );

        group.bench_with_input(BenchmarkId::new("hydrate", size), &stored, |b, stored| {
            b.iter(|| black_box(from_bson_document::<Order>(stored)))
        });
    }

    group.finish();
}

fn bench_builders(c: &mut Criterion) {
    let mut group = c.benchmark_group("builders");

    group.bench_function("filter_range", |b| {
        b.iter(|| {
            black_box(
                FilterBuilder::new()
                    .gte("age", 18)
                    .lt("age", 65)
                    .in_array("status", ["active", "trial"])
                    .to_document(),
            )
        })
    });

    group.bench_function("filter_or_10", |b| {
        b.iter(|| {
            black_box(FilterBuilder::or(
                (0..10).map(|i| FilterBuilder::new().eq("shard", i)),
            ))
        })
    });

    group.bench_function("update_mixed", |b| {
        b.iter(|| {
            black_box(
                UpdateBuilder::new()
                    .set("name", "Ann")
                    .inc("visits", 1)
                    .push("log", "login")
                    .to_document(),
            )
        })
    });

    group.bench_function("pipeline_3_stages", |b| {
        b.iter(|| {
            black_box(
                PipelineBuilder::new()
                    .match_stage(FilterBuilder::new().eq("paid", true))
                    .group(
                        DocumentBuilder::with("_id", "$customer")
                            .add_document("n", DocumentBuilder::with("$sum", 1)),
                    )
                    .sort(DocumentBuilder::with("n", -1))
                    .to_pipeline(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_builders);
criterion_main!(benches);
