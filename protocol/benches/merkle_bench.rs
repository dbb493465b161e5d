// Merkle benchmarks for sector hashing and range proofs.
//
// A full sector root is what an upload pays once per file. Range proof
// verification is what every download pays, so it is measured at a few
// fetch sizes from one bucket up to a whole sector.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use skytrust_protocol::config::SECTOR_SIZE;
use skytrust_protocol::merkle::{
    build_range_proof, merkle_root, merkle_root_with, verify_range_proof, Blake3Hasher,
};

fn sector() -> Vec<u8> {
    (0..SECTOR_SIZE).map(|i| (i % 251) as u8).collect()
}

fn bench_sector_root(c: &mut Criterion) {
    let data = sector();
    let mut group = c.benchmark_group("merkle/sector_root");
    group.throughput(Throughput::Bytes(SECTOR_SIZE));
    group.sample_size(10);
    group.bench_function("blake2b", |b| b.iter(|| merkle_root(&data)));
    group.bench_function("blake3", |b| b.iter(|| merkle_root_with::<Blake3Hasher>(&data)));
    group.finish();
}

fn bench_verify_range(c: &mut Criterion) {
    let data = sector();
    let root = merkle_root(&data).unwrap_or_default();
    let mut group = c.benchmark_group("merkle/verify_range");
    group.sample_size(10);

    for fetch_size in [4096u64, 65_536, 1 << 20, SECTOR_SIZE] {
        let proof = build_range_proof(&data, 0, fetch_size).unwrap_or_default();
        let range = &data[..fetch_size as usize];
        group.throughput(Throughput::Bytes(fetch_size));
        group.bench_with_input(BenchmarkId::from_parameter(fetch_size), &fetch_size, |b, &size| {
            b.iter(|| verify_range_proof(&root, 0, size, range, &proof));
        });
    }
    group.finish();
}

fn bench_build_range(c: &mut Criterion) {
    let data = sector();
    let mut group = c.benchmark_group("merkle/build_range");
    group.sample_size(10);
    group.bench_function("middle_4k", |b| {
        b.iter(|| build_range_proof(&data, SECTOR_SIZE / 2, 4096));
    });
    group.finish();
}

criterion_group!(benches, bench_sector_root, bench_verify_range, bench_build_range);
criterion_main!(benches);
