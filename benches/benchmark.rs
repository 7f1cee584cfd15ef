use async_trait::async_trait;
use audit_browser_pool::{BrowserSettings, Factory, Pool, PoolConfig, PoolError};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures::FutureExt;
use std::time::Duration;
use tokio::runtime::Runtime;

#[cfg(feature = "integration_benchmarks")]
use audit_browser_pool::{probe_page, BrowserFactory};

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_millis(500));
    group.sample_size(20);
}

/// Free-to-create resource so only pool bookkeeping is measured.
struct NoopFactory;

#[async_trait]
impl Factory for NoopFactory {
    type Resource = u64;

    async fn create(&self) -> anyhow::Result<u64> {
        Ok(0)
    }

    async fn destroy(&self, _resource: u64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn validate(&self, _resource: &u64) -> bool {
        true
    }
}

fn bench_pool(rt: &Runtime, max: usize) -> Pool<NoopFactory> {
    let config = PoolConfig {
        min: 0,
        max,
        eviction_interval: Duration::from_secs(3600),
        ..Default::default()
    };
    rt.block_on(async { Pool::new(NoopFactory, config).unwrap() })
}

// === UNIT BENCHMARKS ===

fn benchmark_config_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");
    configure_fast_group(&mut group);

    group.bench_function("creation", |b| {
        b.iter(|| {
            let config = PoolConfig::default();
            black_box(config.validate().is_ok());
        });
    });

    group.bench_function("chrome_args", |b| {
        let settings = BrowserSettings::default();
        b.iter(|| black_box(settings.chrome_args("0")));
    });

    group.finish();
}

fn benchmark_url_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_validation");
    configure_fast_group(&mut group);

    let test_urls = vec![
        "https://example.com",
        "http://example.com/path",
        "invalid-url",
    ];

    group.bench_function("validate", |b| {
        b.iter(|| {
            for url in &test_urls {
                let result = audit_browser_pool::validate_url(url);
                let _ = black_box(result);
            }
        });
    });

    group.finish();
}

fn benchmark_acquire_release(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let pool = bench_pool(&rt, 4);
    let mut group = c.benchmark_group("pool");
    configure_fast_group(&mut group);

    group.bench_function("acquire_release", |b| {
        b.to_async(&rt).iter(|| async {
            let resource = pool.acquire().await.unwrap();
            pool.release(resource).await;
        });
    });

    group.bench_function("execute", |b| {
        b.to_async(&rt).iter(|| async {
            let value = pool
                .execute(|resource| async move { Ok::<_, PoolError>(*resource) }.boxed())
                .await;
            black_box(value.unwrap());
        });
    });

    group.bench_function("stats", |b| {
        b.iter(|| black_box(pool.stats()));
    });

    group.finish();
    rt.block_on(pool.drain());
}

fn benchmark_contended_execute(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let pool = bench_pool(&rt, 2);
    let mut group = c.benchmark_group("contended");
    configure_fast_group(&mut group);

    group.bench_function("execute_16_on_2", |b| {
        b.to_async(&rt).iter(|| async {
            let tasks = (0..16).map(|_| {
                pool.execute(|resource| {
                    async move {
                        tokio::task::yield_now().await;
                        Ok::<_, PoolError>(*resource)
                    }
                    .boxed()
                })
            });
            let results = futures::future::join_all(tasks).await;
            black_box(results.len());
        });
    });

    group.finish();
    rt.block_on(pool.drain());
}

// === INTEGRATION BENCHMARKS (require Chrome) ===

#[cfg(feature = "integration_benchmarks")]
fn benchmark_browser_launch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("browser_launch");
    configure_fast_group(&mut group);

    group.bench_function("warm_up_single", |b| {
        b.iter(|| {
            rt.block_on(async {
                let config = PoolConfig {
                    min: 1,
                    max: 1,
                    ..Default::default()
                };
                let pool = Pool::new(BrowserFactory::new(BrowserSettings::default()), config).unwrap();
                let warmed = pool.warm_up().await.is_ok();
                pool.drain().await;
                black_box(warmed);
            })
        });
    });

    group.finish();
}

#[cfg(feature = "integration_benchmarks")]
fn benchmark_pooled_probe(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("pooled_probe");
    configure_fast_group(&mut group);

    let config = PoolConfig {
        min: 2,
        max: 2,
        ..Default::default()
    };
    let pool = rt.block_on(async {
        let pool = Pool::new(BrowserFactory::new(BrowserSettings::default()), config).unwrap();
        pool.warm_up().await.unwrap();
        pool
    });

    group.bench_function("example_com", |b| {
        b.to_async(&rt).iter(|| async {
            let snapshot = pool
                .execute(|browser| {
                    async move {
                        probe_page(browser, "https://example.com", Duration::from_secs(10)).await
                    }
                    .boxed()
                })
                .await;
            black_box(snapshot.is_ok());
        });
    });

    group.finish();
    rt.block_on(pool.drain());
}

criterion_group!(
    unit_benches,
    benchmark_config_creation,
    benchmark_url_validation,
    benchmark_acquire_release,
    benchmark_contended_execute
);

#[cfg(feature = "integration_benchmarks")]
criterion_group!(
    integration_benches,
    benchmark_browser_launch,
    benchmark_pooled_probe
);

#[cfg(feature = "integration_benchmarks")]
criterion_main!(unit_benches, integration_benches);

#[cfg(not(feature = "integration_benchmarks"))]
criterion_main!(unit_benches);
