//! Ordering stage benchmarks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sluice::prelude::*;

/// Deterministic xorshift sequence so runs are comparable.
fn shuffled(len: usize) -> Vec<u64> {
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        })
        .collect()
}

fn bench_direct_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_direct");

    for len in [100, 1_000, 10_000] {
        let data = shuffled(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| from_slice(data).order().to_vec().unwrap());
        });
    }

    group.finish();
}

fn bench_keyed_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_by_key");

    for len in [100, 1_000, 10_000] {
        let data = shuffled(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| from_slice(data).order_by(|x| *x).to_vec().unwrap());
        });
    }

    group.finish();
}

fn bench_two_level_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_by_then_by");

    for len in [100, 1_000, 10_000] {
        // Few distinct primary keys, so the secondary level does real work.
        let data: Vec<(u64, u64)> = shuffled(len).into_iter().map(|x| (x % 16, x)).collect();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| {
                from_slice(data)
                    .order_by(|p| p.0)
                    .then_by_descending(|p| p.1)
                    .to_vec()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_descending_direct(c: &mut Criterion) {
    let data = shuffled(1_000);

    let mut group = c.benchmark_group("order_descending");
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("1000", |b| {
        b.iter(|| from_slice(&data).order_descending().to_vec().unwrap());
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_direct_sort,
    bench_keyed_sort,
    bench_two_level_sort,
    bench_descending_direct
);
criterion_main!(benches);
