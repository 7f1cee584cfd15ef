use metrics::{register_counter, register_gauge, register_histogram, Counter, Gauge, Histogram};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Point-in-time view of a pool's bookkeeping.
///
/// `size` includes resources still being created, since those already hold
/// a slot under `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub size: usize,
    pub available: usize,
    pub borrowed: usize,
    pub creating: usize,
    pub pending: usize,
    pub min: usize,
    pub max: usize,
    pub draining: bool,
}

impl PoolStats {
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.borrowed as f64 / self.max as f64) * 100.0
    }
}

/// Exported pool telemetry.
///
/// Handles are registered against whatever global recorder is installed;
/// without one every call is a no-op.
pub struct PoolMetrics {
    pub resources_created: Counter,
    pub resources_destroyed: Counter,
    pub creation_failures: Counter,
    pub validation_failures: Counter,
    pub evictions: Counter,
    pub acquisitions: Counter,
    pub acquire_timeouts: Counter,
    pub acquire_wait: Histogram,
    pub size: Gauge,
    pub borrowed: Gauge,
    pub pending: Gauge,
}

impl PoolMetrics {
    /// Registers every series under a `pool` label so several pools in one
    /// process export separately.
    pub fn new(pool: Uuid) -> Self {
        let pool = pool.to_string();
        Self {
            resources_created: register_counter!("browser_pool_resources_created_total", "pool" => pool.clone()),
            resources_destroyed: register_counter!("browser_pool_resources_destroyed_total", "pool" => pool.clone()),
            creation_failures: register_counter!("browser_pool_creation_failures_total", "pool" => pool.clone()),
            validation_failures: register_counter!("browser_pool_validation_failures_total", "pool" => pool.clone()),
            evictions: register_counter!("browser_pool_evictions_total", "pool" => pool.clone()),
            acquisitions: register_counter!("browser_pool_acquisitions_total", "pool" => pool.clone()),
            acquire_timeouts: register_counter!("browser_pool_acquire_timeouts_total", "pool" => pool.clone()),
            acquire_wait: register_histogram!("browser_pool_acquire_wait_seconds", "pool" => pool.clone()),
            size: register_gauge!("browser_pool_size", "pool" => pool.clone()),
            borrowed: register_gauge!("browser_pool_borrowed", "pool" => pool.clone()),
            pending: register_gauge!("browser_pool_pending", "pool" => pool),
        }
    }

    pub fn record_acquire(&self, waited: Duration) {
        self.acquisitions.increment(1);
        self.acquire_wait.record(waited.as_secs_f64());
    }

    pub fn record_stats(&self, stats: &PoolStats) {
        self.size.set(stats.size as f64);
        self.borrowed.set(stats.borrowed as f64);
        self.pending.set(stats.pending as f64);
    }
}

/// Installs the Prometheus recorder and its `/metrics` HTTP listener.
///
/// Must run inside a Tokio runtime; call it before building any pool so the
/// pool's handles bind to this recorder.
pub fn install_prometheus_exporter(port: u16) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;

    info!("Prometheus metrics listening on port {}", port);
    Ok(())
}
