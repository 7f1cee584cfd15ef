use crate::{Factory, Pool, PoolStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthLevel {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthThresholds {
    /// Borrowed share of `max`, in percent, above which the pool is busy
    pub max_utilization: f64,
    pub warn_pending: usize,
    pub critical_pending: usize,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_utilization: 90.0,
            warn_pending: 10,
            critical_pending: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub level: HealthLevel,
    pub reasons: Vec<String>,
    pub stats: PoolStats,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.level == HealthLevel::Healthy
    }

    pub fn log(&self) {
        match self.level {
            HealthLevel::Healthy => debug!(
                "Pool healthy: {}/{} borrowed, {} available, {} pending",
                self.stats.borrowed, self.stats.max, self.stats.available, self.stats.pending
            ),
            HealthLevel::Warning => warn!("Pool health warning: {}", self.reasons.join("; ")),
            HealthLevel::Critical => error!("Pool health critical: {}", self.reasons.join("; ")),
        }
    }
}

/// Classifies a stats snapshot. The worst finding decides the level.
pub fn assess(stats: &PoolStats, thresholds: &HealthThresholds) -> HealthReport {
    let mut findings: Vec<(HealthLevel, String)> = Vec::new();

    if stats.draining {
        findings.push((HealthLevel::Critical, "pool is draining".to_string()));
    }

    if stats.size == 0 && stats.pending > 0 {
        findings.push((
            HealthLevel::Critical,
            format!("{} callers waiting on an empty pool", stats.pending),
        ));
    }

    if stats.pending >= thresholds.critical_pending {
        findings.push((
            HealthLevel::Critical,
            format!("queue depth {}", stats.pending),
        ));
    } else if stats.pending >= thresholds.warn_pending {
        findings.push((HealthLevel::Warning, format!("queue depth {}", stats.pending)));
    }

    let utilization = stats.utilization();
    if utilization >= thresholds.max_utilization {
        findings.push((
            HealthLevel::Warning,
            format!("utilization {utilization:.1}%"),
        ));
    }

    if !stats.draining && stats.size < stats.min {
        findings.push((
            HealthLevel::Warning,
            format!("{} resources, below minimum {}", stats.size, stats.min),
        ));
    }

    let level = findings
        .iter()
        .map(|(level, _)| *level)
        .max()
        .unwrap_or(HealthLevel::Healthy);

    HealthReport {
        level,
        reasons: findings.into_iter().map(|(_, reason)| reason).collect(),
        stats: *stats,
        checked_at: Utc::now(),
    }
}

/// Logs a health report every `period` until the pool starts draining.
pub fn monitor<F: Factory>(
    pool: Pool<F>,
    thresholds: HealthThresholds,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            if pool.is_draining() {
                break;
            }
            assess(&pool.stats(), &thresholds).log();
        }
        info!("Health monitor stopped");
    })
}
