//! Periodic reclamation of idle capacity.

use crate::pool::{Entry, PoolInner};
use crate::{Factory, Pool};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Handle on a running eviction loop.
pub(crate) struct Scheduler {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Scheduler {
    /// Signals the loop and waits for it to exit. A sweep already in
    /// progress finishes first.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            if e.is_panic() {
                error!("Eviction scheduler panicked: {}", e);
            }
        }
    }
}

pub(crate) fn spawn_scheduler<F: Factory>(
    runtime: &Handle,
    pool: Weak<PoolInner<F>>,
    period: Duration,
) -> Scheduler {
    let (shutdown, mut stop) = watch::channel(false);

    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(inner) = pool.upgrade() else { break };
                    let evicted = inner.sweep().await;
                    if evicted > 0 {
                        info!("Evicted {} idle resources", evicted);
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Eviction scheduler stopped");
    });

    Scheduler { shutdown, task }
}

impl<F: Factory> PoolInner<F> {
    /// One eviction pass. Returns how many resources were evicted for
    /// idleness.
    pub(crate) async fn sweep(self: &Arc<Self>) -> usize {
        let now = Instant::now();

        let (expired, to_probe) = {
            let mut state = self.state.lock();
            if state.draining {
                return 0;
            }

            let mut idle: Vec<Entry<F::Resource>> = state.available.drain(..).collect();
            idle.sort_by_key(|entry| entry.last_released);

            // Most idle first; never evict below `min`.
            let mut surplus = (state.size() + idle.len()).saturating_sub(self.config.min);
            let mut expired = Vec::new();
            for entry in idle {
                let idle_for = now.saturating_duration_since(entry.last_released);
                if surplus > 0 && idle_for > self.config.idle_timeout {
                    surplus -= 1;
                    expired.push(entry);
                } else {
                    state.available.push_back(entry);
                }
            }
            state.destroying += expired.len();

            let to_probe: Vec<Entry<F::Resource>> = if self.config.test_while_idle {
                state.available.drain(..).collect()
            } else {
                Vec::new()
            };
            state.probing += to_probe.len();

            (expired, to_probe)
        };

        let evicted = expired.len();
        for entry in expired {
            self.metrics.evictions.increment(1);
            self.destroy(entry, "idle timeout").await;
        }

        for entry in to_probe {
            let alive = self.check_alive(&entry.resource).await;
            let doomed = {
                let mut state = self.state.lock();
                state.probing -= 1;
                if alive {
                    Self::settle_locked(&mut state, entry)
                } else {
                    warn!("Idle resource {} failed its liveness probe", entry.id);
                    self.metrics.validation_failures.increment(1);
                    state.destroying += 1;
                    Some(entry)
                }
            };
            if let Some(entry) = doomed {
                self.destroy(entry, "failed idle probe").await;
            }
        }

        self.ensure_minimum();
        self.publish_stats();
        evicted
    }
}

impl<F: Factory> Pool<F> {
    /// Runs one eviction pass right away and returns how many resources it
    /// evicted for idleness.
    pub async fn evict_now(&self) -> usize {
        let inner = self.inner.clone();
        match tokio::spawn(async move { inner.sweep().await }).await {
            Ok(evicted) => evicted,
            Err(e) => {
                error!("Eviction pass failed: {}", e);
                0
            }
        }
    }
}
