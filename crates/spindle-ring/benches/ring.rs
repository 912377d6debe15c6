//! Benchmarks for ring construction and lookups.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use spindle_ring::{Blake3, Crc32, KeyHasher, Ring};

const MEMBERS: u32 = 16;

fn build<H: KeyHasher>(hasher: H, multiplier: u32) -> Ring<H> {
    let mut ring = Ring::with_hasher(hasher).with_weight_multiplier(multiplier);
    for n in 0..MEMBERS {
        let id = format!("member-{n}");
        ring.add(&id, id.as_bytes(), n % 4 + 1).unwrap();
    }
    ring
}

fn bench_keys(count: u32) -> Vec<[u8; 8]> {
    let mut state: u64 = 0xDEAD_BEEF;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            state.to_le_bytes()
        })
        .collect()
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_add");
    for multiplier in [1u32, 64, 256] {
        group.bench_with_input(
            BenchmarkId::from_parameter(multiplier),
            &multiplier,
            |b, &multiplier| {
                b.iter(|| build(Crc32, multiplier));
            },
        );
    }
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let keys = bench_keys(1024);
    let mut group = c.benchmark_group("ring_get");
    for multiplier in [1u32, 64, 256] {
        let crc = build(Crc32, multiplier);
        group.bench_with_input(BenchmarkId::new("crc32", multiplier), &keys, |b, keys| {
            b.iter(|| keys.iter().filter_map(|k| crc.get(k)).count());
        });

        let blake = build(Blake3, multiplier);
        group.bench_with_input(BenchmarkId::new("blake3", multiplier), &keys, |b, keys| {
            b.iter(|| keys.iter().filter_map(|k| blake.get(k)).count());
        });
    }
    group.finish();
}

fn bench_ordered(c: &mut Criterion) {
    let keys = bench_keys(256);
    let mut group = c.benchmark_group("ring_ordered");
    for multiplier in [1u32, 64, 256] {
        let ring = build(Crc32, multiplier);
        group.bench_with_input(BenchmarkId::from_parameter(multiplier), &keys, |b, keys| {
            b.iter(|| keys.iter().map(|k| ring.ordered(k).len()).sum::<usize>());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_get, bench_ordered);
criterion_main!(benches);
