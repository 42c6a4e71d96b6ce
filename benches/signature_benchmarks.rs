//! Benchmarks for the webhook hot path.
//!
//! Covers HMAC verification across payload sizes and a full signed
//! `conversation_started` request through the router.

use std::{hint::black_box, time::Duration};

use callclock_api::crypto::{generate_hmac_hex, verify_signature};
use callclock_testing::{TestEnv, WebhookBuilder, TEST_SECRET};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

/// Benchmarks signature verification for different body sizes.
fn bench_signature_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");

    for size in [128usize, 1024, 16 * 1024, 256 * 1024] {
        let payload = vec![b'x'; size];
        let signature = generate_hmac_hex(&payload, TEST_SECRET).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("verify", size), &payload, |b, payload| {
            b.iter(|| verify_signature(black_box(payload), black_box(&signature), TEST_SECRET));
        });
    }

    group.finish();
}

/// Benchmarks a signed start event followed by an elapsed lookup.
fn bench_request_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let env = TestEnv::new();

    let mut group = c.benchmark_group("router");
    group.measurement_time(Duration::from_secs(10));

    let mut counter = 0u64;
    group.bench_function("start_then_elapsed", |b| {
        b.iter(|| {
            counter += 1;
            let id = format!("bench_{counter}");
            rt.block_on(async {
                let request = WebhookBuilder::conversation_started(TEST_SECRET, &id).build();
                let started = env.send(request).await.unwrap();
                let elapsed = env.elapsed(&id).await.unwrap();
                black_box((started.status, elapsed.status))
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_signature_verification, bench_request_round_trip);
criterion_main!(benches);
