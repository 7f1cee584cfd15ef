//! Orderly one-time shutdown of a pool.

use crate::{Factory, Pool, PoolError};
use tracing::{debug, info};

impl<F: Factory> Pool<F> {
    /// Shuts the pool down and waits until every resource is destroyed.
    ///
    /// Queued waiters fail with [`PoolError::Drained`], the eviction
    /// scheduler is stopped before anything is torn down, idle resources are
    /// destroyed immediately and borrowed ones as they come back. Later
    /// `acquire()` calls fail fast. Concurrent or repeated calls all wait for
    /// the same end state, and dropping one part way through leaves the
    /// others able to finish the job.
    pub async fn drain(&self) {
        let first = {
            let mut state = self.inner.state.lock();
            let first = !state.draining;
            state.draining = true;
            if first {
                Some(state.take_waiters())
            } else {
                None
            }
        };

        if let Some(waiters) = first {
            info!(
                "Draining pool {} ({} waiters rejected)",
                self.inner.id,
                waiters.len()
            );
            for waiter in waiters {
                let _ = waiter.send(Err(PoolError::Drained));
            }

            let scheduler = self.inner.scheduler.lock().take();
            if let Some(scheduler) = scheduler {
                scheduler.stop().await;
            }
        }

        loop {
            let shrunk = self.inner.shrunk.notified();
            tokio::pin!(shrunk);
            shrunk.as_mut().enable();

            // Every caller tears down what is idle, so a cancelled earlier
            // call cannot leave resources behind.
            if self.destroy_idle() > 0 {
                continue;
            }

            {
                let state = self.inner.state.lock();
                if state.size() == 0 && state.destroying == 0 {
                    break;
                }
                debug!(
                    "Drain waiting on {} borrowed, {} creating, {} destroying",
                    state.borrowed.len(),
                    state.creating,
                    state.destroying
                );
            }

            shrunk.await;
        }

        self.inner.publish_stats();
        info!("Pool {} drained", self.inner.id);
    }

    /// Hands every idle resource to a detached destroy task.
    fn destroy_idle(&self) -> usize {
        let idle: Vec<_> = {
            let mut state = self.inner.state.lock();
            let idle: Vec<_> = state.available.drain(..).collect();
            state.destroying += idle.len();
            idle
        };
        let count = idle.len();
        for entry in idle {
            self.inner.spawn_destroy(entry, "pool draining");
        }
        count
    }
}
