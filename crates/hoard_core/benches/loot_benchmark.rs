//! # Loot Resolution Benchmark
//!
//! Resolution is expected to complete in microseconds, bounded by
//! `count x nesting depth`.
//!
//! Run with: `cargo bench --package hoard_core`

// Benchmarks don't need docs
#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hoard_core::{LootEntry, LootTable, Rarity, Reward, SeededRandom};

/// Flat table with `width` weighted leaves.
fn flat_table(width: usize, count: u32) -> LootTable {
    let contents = (0..width)
        .map(|i| {
            LootEntry::leaf(Reward::empty())
                .with_chance(1.0 + (i % 7) as f64)
                .shared()
        })
        .collect();
    LootTable::new(count, contents)
}

/// Table nested `depth` levels deep, every level always expanding the next.
fn nested_table(depth: usize, width: usize) -> LootTable {
    let mut table = flat_table(width, 2);
    for _ in 0..depth {
        let mut contents: Vec<Arc<LootEntry>> = (0..width)
            .map(|_| LootEntry::leaf(Reward::empty()).with_chance(1.0).shared())
            .collect();
        contents.push(LootEntry::table(table).with_always(true).shared());
        table = LootTable::new(2, contents);
    }
    table
}

fn bench_flat_loot(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_loot");

    for width in [8, 64, 512] {
        let table = flat_table(width, 5);
        let mut rng = SeededRandom::new(42);
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| black_box(table.loot(None, &mut rng)).len());
        });
    }

    group.finish();
}

fn bench_capped_unique(c: &mut Criterion) {
    let rare = Rarity::new().with_name("rare").with_max(2);
    let contents = (0..64)
        .map(|i| {
            let entry = LootEntry::leaf(Reward::empty()).with_chance(1.0).with_unique(i % 2 == 0);
            if i % 4 == 0 {
                entry.with_rarity(rare.clone()).shared()
            } else {
                entry.shared()
            }
        })
        .collect();
    let table = LootTable::new(32, contents);
    let mut rng = SeededRandom::new(7);

    c.bench_function("capped_unique_64x32", |b| {
        b.iter(|| black_box(table.loot(None, &mut rng)).len());
    });
}

fn bench_nested_loot(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_loot");

    for depth in [1, 4, 16] {
        let table = nested_table(depth, 16);
        let mut rng = SeededRandom::new(1);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(table.loot(None, &mut rng)).len());
        });
    }

    group.finish();
}

fn bench_cached_result(c: &mut Criterion) {
    let table = flat_table(64, 5);
    let mut rng = SeededRandom::new(3);
    table.loot(None, &mut rng);

    c.bench_function("cached_result", |b| {
        b.iter(|| black_box(table.result(None, &mut rng)).len());
    });
}

criterion_group!(
    benches,
    bench_flat_loot,
    bench_capped_unique,
    bench_nested_loot,
    bench_cached_result
);
criterion_main!(benches);
