use std::time::Duration;

use checkout::{JobRegistry, RegistryConfig, ValidationProtocol};
use common::Money;
use criterion::{Criterion, criterion_group, criterion_main};
use tokio::time::Instant;

fn registry() -> JobRegistry {
    JobRegistry::new(RegistryConfig::new(Duration::from_secs(40), "MyStoreQR"))
}

fn bench_create_transaction(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = registry();

    c.bench_function("registry/create_transaction", |b| {
        b.iter(|| {
            rt.block_on(async {
                registry
                    .create_transaction(Money::from_cents(1250))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_poll_known_id(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = registry();
    let job = rt.block_on(async {
        for _ in 0..1_000 {
            registry.create_transaction(Money::zero()).await.unwrap();
        }
        registry.create_transaction(Money::from_cents(500)).await.unwrap()
    });
    let protocol = ValidationProtocol::new(registry);
    let uid = job.id().to_string();

    c.bench_function("protocol/poll_known_id", |b| {
        b.iter(|| {
            rt.block_on(async {
                protocol.poll(Some(&uid)).await;
            });
        });
    });
}

fn bench_sweep_10k_jobs(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = registry();
    rt.block_on(async {
        for _ in 0..10_000 {
            registry.create_transaction(Money::zero()).await.unwrap();
        }
    });

    c.bench_function("registry/sweep_10k_jobs", |b| {
        b.iter(|| {
            rt.block_on(async {
                registry.sweep(Instant::now()).await;
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_transaction,
    bench_poll_known_id,
    bench_sweep_10k_jobs
);
criterion_main!(benches);
