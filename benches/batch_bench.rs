use asn_finder::{
    build_rows, AsnLookup, AsnLookupError, AsnRecord, BatchConfig, BatchEngine, LookupClient,
    NoProgress,
};
use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::net::IpAddr;
use std::sync::Arc;

struct InstantClient;

#[async_trait]
impl LookupClient for InstantClient {
    async fn lookup(&self, ip: IpAddr) -> Result<AsnRecord, AsnLookupError> {
        Ok(AsnRecord::new("64500", "BENCH", "ZZ", &format!("{ip}/32"), "test"))
    }
}

fn sample_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("10.{}.{}.{}", (i >> 16) & 0xff, (i >> 8) & 0xff, i & 0xff))
        .collect()
}

fn benchmark_batch_concurrency(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ips = sample_ips(1_000);

    for concurrency in [1, 10, 50] {
        let config = BatchConfig::builder()
            .concurrency(concurrency)
            .build()
            .unwrap();
        let engine = BatchEngine::new(config, Arc::new(InstantClient)).unwrap();

        c.bench_function(&format!("batch_1000_ips_{concurrency}_workers"), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let result = engine.run(black_box(&ips), &mut NoProgress).await;
                    black_box(result.summary);
                })
            })
        });
    }
}

fn benchmark_special_use_lookups(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ips = sample_ips(1_000);
    let engine = BatchEngine::new(BatchConfig::default(), Arc::new(AsnLookup::new())).unwrap();

    // Private addresses are answered without touching the network.
    c.bench_function("batch_1000_private_ips_cymru_client", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let result = engine.run(black_box(&ips), &mut NoProgress).await;
                black_box(result.summary);
            })
        })
    });
}

fn benchmark_build_rows(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ips = sample_ips(5_000);
    let engine = BatchEngine::new(BatchConfig::default(), Arc::new(InstantClient)).unwrap();
    let completed = runtime
        .block_on(engine.run(&ips, &mut NoProgress))
        .completed;

    c.bench_function("build_rows_5000_full_vpn", |b| {
        b.iter(|| build_rows(black_box(&completed), true, true))
    });
}

criterion_group!(
    benches,
    benchmark_batch_concurrency,
    benchmark_special_use_lookups,
    benchmark_build_rows
);
criterion_main!(benches);
