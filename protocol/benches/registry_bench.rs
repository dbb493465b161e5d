// Registry benchmarks: key derivation, entry signing and verification, and
// walking a resolver chain.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use skytrust_protocol::crypto::SkyKeypair;
use skytrust_protocol::registry::{derive_entry_keys, resolver_link, sign_entry, verify_entry};
use skytrust_protocol::resolver::{verify_resolver_chain, ResolverProof};
use skytrust_protocol::Skylink;

const SEED: [u8; 16] = [0x42; 16];

fn bench_derive_keys(c: &mut Criterion) {
    c.bench_function("registry/derive_entry_keys", |b| {
        b.iter(|| derive_entry_keys(&SEED, "bench-keypair", "bench-data-key"));
    });
}

fn bench_sign_verify(c: &mut Criterion) {
    let keypair = SkyKeypair::from_seed(&[7; 32]);
    let data_key = [3u8; 32];
    let data = [0xabu8; 34];

    c.bench_function("registry/sign_entry", |b| {
        b.iter(|| sign_entry(&keypair, &data_key, &data, 12));
    });

    if let Ok(entry) = sign_entry(&keypair, &data_key, &data, 12) {
        let public_key = keypair.public_key();
        c.bench_function("registry/verify_entry", |b| {
            b.iter(|| verify_entry(&public_key, &data_key, &entry.data, entry.revision, &entry.signature));
        });
    }
}

/// A chain of `hops` resolver links ending on a V1 link.
fn chain(hops: usize) -> Option<(Skylink, Vec<ResolverProof>)> {
    let mut target = Skylink::new_v1(4096, &[0x99; 32]).ok()?;
    let mut proofs = Vec::with_capacity(hops);
    for hop in 0..hops {
        let keypair = SkyKeypair::from_seed(&[hop as u8 + 1; 32]);
        let data_key = [hop as u8; 32];
        proofs.push(ResolverProof::new_signed(&keypair, &data_key, &target, hop as u64).ok()?);
        target = resolver_link(&keypair.public_key(), &data_key);
    }
    proofs.reverse();
    Some((target, proofs))
}

fn bench_resolver_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/resolver_chain");
    for hops in [1usize, 4, 16] {
        if let Some((start, proofs)) = chain(hops) {
            group.bench_with_input(BenchmarkId::from_parameter(hops), &hops, |b, _| {
                b.iter(|| verify_resolver_chain(&start, &proofs));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_derive_keys, bench_sign_verify, bench_resolver_chain);
criterion_main!(benches);
