//! Bounded pool of expensive, fallible resources
//!
//! The pool lends out resources produced by a [`Factory`], takes them back,
//! and keeps the count between `min` and `max`. All bookkeeping sits behind
//! one short-lived lock; every `Factory` call happens outside of it, usually
//! in a spawned task so a cancelled caller cannot strand a resource half way
//! through a transition.

use crate::eviction::{spawn_scheduler, Scheduler};
use crate::{Factory, PoolConfig, PoolError, PoolMetrics, PoolStats};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::ops::{Deref, DerefMut};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What a pending acquisition eventually receives.
pub(crate) type Delivery<R> = Result<Entry<R>, PoolError>;

/// A resource plus the bookkeeping the pool keeps about it.
pub(crate) struct Entry<R> {
    pub(crate) id: u64,
    pub(crate) resource: R,
    pub(crate) created_at: Instant,
    pub(crate) last_released: Instant,
    pub(crate) lend_count: u64,
}

impl<R> Entry<R> {
    fn new(id: u64, resource: R) -> Self {
        let now = Instant::now();
        Self {
            id,
            resource,
            created_at: now,
            last_released: now,
            lend_count: 0,
        }
    }
}

struct Waiter<R> {
    id: u64,
    tx: oneshot::Sender<Delivery<R>>,
}

pub(crate) struct State<R> {
    pub(crate) available: VecDeque<Entry<R>>,
    pub(crate) borrowed: HashSet<u64>,
    /// Creations in flight, each holding a slot under `max`.
    pub(crate) creating: usize,
    /// Subset of `creating` not tied to a specific caller.
    background: usize,
    /// Idle resources taken out for a liveness probe.
    pub(crate) probing: usize,
    /// Resources already forgotten by the counters but still shutting down.
    pub(crate) destroying: usize,
    waiters: VecDeque<Waiter<R>>,
    next_resource_id: u64,
    next_waiter_id: u64,
    pub(crate) draining: bool,
}

impl<R> State<R> {
    fn new(max: usize) -> Self {
        Self {
            available: VecDeque::with_capacity(max),
            borrowed: HashSet::with_capacity(max),
            creating: 0,
            background: 0,
            probing: 0,
            destroying: 0,
            waiters: VecDeque::new(),
            next_resource_id: 0,
            next_waiter_id: 0,
            draining: false,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.available.len() + self.borrowed.len() + self.creating + self.probing
    }

    pub(crate) fn take_waiters(&mut self) -> Vec<oneshot::Sender<Delivery<R>>> {
        self.waiters.drain(..).map(|waiter| waiter.tx).collect()
    }
}

pub(crate) struct PoolInner<F: Factory> {
    pub(crate) id: Uuid,
    pub(crate) factory: F,
    pub(crate) config: PoolConfig,
    pub(crate) state: Mutex<State<F::Resource>>,
    pub(crate) metrics: PoolMetrics,
    /// Signalled whenever the pool shrinks, so `drain` can wait for zero.
    pub(crate) shrunk: Notify,
    pub(crate) scheduler: Mutex<Option<Scheduler>>,
}

/// Concurrency-safe pool of resources created by a [`Factory`].
///
/// Cloning is cheap and every clone refers to the same pool. The pool never
/// installs signal handlers; the embedding application calls
/// [`drain`](Pool::drain) when it shuts down.
///
/// # Examples
///
/// ```rust,no_run
/// use audit_browser_pool::{BrowserFactory, BrowserSettings, Pool, PoolConfig, PoolError};
/// use futures::FutureExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), PoolError> {
///     let factory = BrowserFactory::new(BrowserSettings::default());
///     let pool = Pool::new(factory, PoolConfig::default())?;
///
///     let version = pool
///         .execute(|browser| {
///             async move {
///                 browser
///                     .browser()
///                     .version()
///                     .await
///                     .map(|v| v.product)
///                     .map_err(|e| PoolError::Task(e.to_string()))
///             }
///             .boxed()
///         })
///         .await?;
///     println!("{version}");
///
///     pool.drain().await;
///     Ok(())
/// }
/// ```
pub struct Pool<F: Factory> {
    pub(crate) inner: Arc<PoolInner<F>>,
}

impl<F: Factory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

enum Checkout<F: Factory> {
    Ready(Entry<F::Resource>),
    Pending(Ticket<F>),
}

impl<F: Factory> Pool<F> {
    /// Builds an empty pool and starts its eviction scheduler.
    ///
    /// Must be called from within a Tokio runtime. Nothing is created up
    /// front; call [`warm_up`](Pool::warm_up) to open `min` resources eagerly.
    pub fn new(factory: F, config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| PoolError::Runtime(e.to_string()))?;

        let id = Uuid::new_v4();
        let inner = Arc::new(PoolInner {
            id,
            metrics: PoolMetrics::new(id),
            factory,
            state: Mutex::new(State::new(config.max)),
            config,
            shrunk: Notify::new(),
            scheduler: Mutex::new(None),
        });

        let scheduler = spawn_scheduler(
            &runtime,
            Arc::downgrade(&inner),
            inner.config.eviction_interval,
        );
        *inner.scheduler.lock() = Some(scheduler);

        info!(
            "Pool {} ready (min={}, max={}, acquire_timeout={:?})",
            inner.id, inner.config.min, inner.config.max, inner.config.acquire_timeout
        );

        Ok(Self { inner })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Identifier used in logs and as the `pool` label on exported metrics.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn is_draining(&self) -> bool {
        self.inner.state.lock().draining
    }

    /// Snapshot of the current bookkeeping. Never mutates the pool.
    pub fn stats(&self) -> PoolStats {
        self.inner.stats()
    }

    /// Opens resources until the pool holds `min`, waiting for each launch.
    pub async fn warm_up(&self) -> Result<(), PoolError> {
        let deadline = tokio::time::Instant::now() + self.inner.config.acquire_timeout;
        let tickets = {
            let mut state = self.inner.state.lock();
            if state.draining {
                return Err(PoolError::Drained);
            }
            let missing = self.inner.config.min.saturating_sub(state.size());
            state.creating += missing;
            missing
        };

        let mut pending = Vec::with_capacity(tickets);
        for _ in 0..tickets {
            let (tx, rx) = oneshot::channel();
            self.inner.spawn_create(Some(tx));
            pending.push(Ticket::creation(self.inner.clone(), rx).redeem(deadline));
        }

        let mut first_error = None;
        for outcome in futures::future::join_all(pending).await {
            match outcome {
                Ok(entry) => self.inner.return_unused(entry),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("Pool {} warmed up to {} resources", self.inner.id, self.inner.config.min);
                Ok(())
            }
        }
    }

    /// Borrows a resource for exclusive use until it is released.
    ///
    /// Reuses the most recently released resource when one is available,
    /// otherwise creates one while below `max`, otherwise queues behind
    /// earlier waiters. The whole call is bounded by the acquire timeout.
    pub async fn acquire(&self) -> Result<PooledResource<F>, PoolError> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.inner.config.acquire_timeout;

        loop {
            let checkout = self.inner.checkout()?;
            self.inner.publish_stats();
            let (entry, reused) = match checkout {
                Checkout::Ready(entry) => (entry, true),
                Checkout::Pending(ticket) => {
                    let reused = ticket.kind != TicketKind::Creation;
                    (ticket.redeem(deadline).await?, reused)
                }
            };

            let handle = PooledResource {
                entry: Some(entry),
                pool: self.inner.clone(),
            };

            let needs_probe = reused && self.inner.config.test_on_borrow;
            if needs_probe && !self.inner.check_alive(&*handle).await {
                let mut handle = handle;
                if let Some(entry) = handle.entry.take() {
                    warn!("Resource {} failed validation on borrow, destroying it", entry.id);
                    self.inner.metrics.validation_failures.increment(1);
                    self.inner.retire_borrowed(entry, "failed validation");
                }
                continue;
            }

            self.inner.metrics.record_acquire(started.elapsed());
            self.inner.publish_stats();
            debug!("Lent resource {} (lend #{})", handle.id(), handle.lend_count());
            return Ok(handle);
        }
    }

    /// Returns a borrowed resource to service.
    ///
    /// A resource belonging to a different pool is left alone with a
    /// warning; it goes back to its own pool when dropped.
    pub async fn release(&self, mut resource: PooledResource<F>) {
        if resource.pool.id != self.inner.id {
            warn!(
                "Ignoring release of resource from pool {} on pool {}",
                resource.pool.id, self.inner.id
            );
            return;
        }

        if let Some(entry) = resource.entry.take() {
            let task = self.inner.spawn_release(entry);
            if let Err(e) = task.await {
                error!("Release task failed: {}", e);
            }
        }
    }

    /// Runs `task` against a borrowed resource and always gives it back.
    ///
    /// Errors from `task` are returned untouched; pool failures are converted
    /// with `E::from` before `task` ever runs. If the returned future is
    /// dropped mid-task, the resource is still released.
    pub async fn execute<T, E, Task>(&self, task: Task) -> Result<T, E>
    where
        Task: for<'r> FnOnce(&'r mut F::Resource) -> BoxFuture<'r, Result<T, E>>,
        E: From<PoolError>,
    {
        let mut resource = self.acquire().await?;
        let outcome = task(&mut *resource).await;
        self.release(resource).await;
        outcome
    }
}

impl<F: Factory> PoolInner<F> {
    pub(crate) fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            size: state.size(),
            available: state.available.len() + state.probing,
            borrowed: state.borrowed.len(),
            creating: state.creating,
            pending: state.waiters.len(),
            min: self.config.min,
            max: self.config.max,
            draining: state.draining,
        }
    }

    /// Pushes the current counts to the exported gauges.
    pub(crate) fn publish_stats(&self) {
        self.metrics.record_stats(&self.stats());
    }

    /// Liveness check through the factory. A panicking probe counts as dead.
    pub(crate) fn check_alive<'a>(
        &'a self,
        resource: &'a F::Resource,
    ) -> impl std::future::Future<Output = bool> + Send + 'a {
        AssertUnwindSafe(self.factory.validate(resource))
            .catch_unwind()
            .map(|result| match result {
                Ok(alive) => alive,
                Err(_) => {
                    warn!("Factory panicked while validating a resource");
                    false
                }
            })
    }

    fn checkout(self: &Arc<Self>) -> Result<Checkout<F>, PoolError> {
        let mut state = self.state.lock();
        if state.draining {
            return Err(PoolError::Drained);
        }

        if let Some(mut entry) = state.available.pop_back() {
            entry.lend_count += 1;
            state.borrowed.insert(entry.id);
            return Ok(Checkout::Ready(entry));
        }

        let (tx, rx) = oneshot::channel();
        if state.size() < self.config.max {
            state.creating += 1;
            drop(state);
            self.spawn_create(Some(tx));
            return Ok(Checkout::Pending(Ticket::creation(self.clone(), rx)));
        }

        let waiter_id = state.next_waiter_id;
        state.next_waiter_id += 1;
        state.waiters.push_back(Waiter { id: waiter_id, tx });
        debug!("Queued waiter {} ({} pending)", waiter_id, state.waiters.len());

        Ok(Checkout::Pending(Ticket {
            inner: self.clone(),
            kind: TicketKind::Queued(waiter_id),
            rx,
            settled: false,
        }))
    }

    /// Hands an entry to the oldest live waiter, or parks it as available.
    ///
    /// The entry must not be on the borrowed list and the pool must not be
    /// draining.
    fn admit_locked(state: &mut State<F::Resource>, mut entry: Entry<F::Resource>) {
        while let Some(waiter) = state.waiters.pop_front() {
            entry.lend_count += 1;
            state.borrowed.insert(entry.id);
            match waiter.tx.send(Ok(entry)) {
                Ok(()) => {
                    debug!("Handed resource directly to waiter {}", waiter.id);
                    return;
                }
                Err(returned) => match returned {
                    Ok(mut back) => {
                        state.borrowed.remove(&back.id);
                        back.lend_count -= 1;
                        entry = back;
                    }
                    Err(_) => return,
                },
            }
        }
        state.available.push_back(entry);
    }

    /// Puts an unused entry back into service, or marks it for destruction
    /// when the pool is draining. Returns the entry the caller must destroy.
    pub(crate) fn settle_locked(
        state: &mut State<F::Resource>,
        entry: Entry<F::Resource>,
    ) -> Option<Entry<F::Resource>> {
        if state.draining {
            state.destroying += 1;
            Some(entry)
        } else {
            Self::admit_locked(state, entry);
            None
        }
    }

    /// Takes back a borrowed entry that never reached its caller.
    fn return_unused(self: &Arc<Self>, mut entry: Entry<F::Resource>) {
        let doomed = {
            let mut state = self.state.lock();
            state.borrowed.remove(&entry.id);
            entry.lend_count = entry.lend_count.saturating_sub(1);
            Self::settle_locked(&mut state, entry)
        };
        if let Some(entry) = doomed {
            self.spawn_destroy(entry, "pool draining");
        }
    }

    fn retire_borrowed(self: &Arc<Self>, entry: Entry<F::Resource>, reason: &'static str) {
        {
            let mut state = self.state.lock();
            state.borrowed.remove(&entry.id);
            state.destroying += 1;
        }
        self.spawn_destroy(entry, reason);
    }

    pub(crate) fn spawn_create(self: &Arc<Self>, reply: Option<oneshot::Sender<Delivery<F::Resource>>>) {
        let inner = self.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let created = match AssertUnwindSafe(inner.factory.create()).catch_unwind().await {
                Ok(created) => created,
                Err(_) => Err(anyhow::anyhow!("factory panicked while creating a resource")),
            };

            match created {
                Ok(resource) => inner.admit_created(resource, reply, started.elapsed()).await,
                Err(err) => inner.creation_failed(err, reply),
            }
        });
    }

    async fn admit_created(
        self: &Arc<Self>,
        resource: F::Resource,
        reply: Option<oneshot::Sender<Delivery<F::Resource>>>,
        took: Duration,
    ) {
        self.metrics.resources_created.increment(1);

        let doomed = {
            let mut state = self.state.lock();
            state.creating -= 1;
            if reply.is_none() {
                state.background -= 1;
            }

            let id = state.next_resource_id;
            state.next_resource_id += 1;
            let mut entry = Entry::new(id, resource);
            debug!("Created resource {} in {:?}", id, took);

            if state.draining {
                if let Some(tx) = reply {
                    let _ = tx.send(Err(PoolError::Drained));
                }
                state.destroying += 1;
                Some(entry)
            } else if let Some(tx) = reply {
                entry.lend_count = 1;
                state.borrowed.insert(id);
                if let Err(Ok(mut unclaimed)) = tx.send(Ok(entry)) {
                    // The caller gave up while this was launching; keep the work.
                    debug!("Caller left before resource {} was ready, pooling it", id);
                    state.borrowed.remove(&id);
                    unclaimed.lend_count = 0;
                    Self::admit_locked(&mut state, unclaimed);
                }
                None
            } else {
                Self::admit_locked(&mut state, entry);
                None
            }
        };

        if let Some(entry) = doomed {
            self.destroy(entry, "pool draining").await;
        }
        self.shrunk.notify_waiters();
        self.publish_stats();
    }

    fn creation_failed(
        self: &Arc<Self>,
        err: anyhow::Error,
        reply: Option<oneshot::Sender<Delivery<F::Resource>>>,
    ) {
        error!("Failed to create pooled resource: {:#}", err);
        self.metrics.creation_failures.increment(1);

        {
            let mut state = self.state.lock();
            state.creating -= 1;
            if reply.is_none() {
                state.background -= 1;
            }
        }
        self.shrunk.notify_waiters();
        self.publish_stats();

        // Background top-ups do not retry, so a dead factory cannot spin.
        if let Some(tx) = reply {
            let _ = tx.send(Err(PoolError::Creation(format!("{err:#}"))));
            self.replenish();
        }
    }

    /// Starts creations for queued waiters that now fit under `max`.
    pub(crate) fn replenish(self: &Arc<Self>) {
        let count = {
            let mut state = self.state.lock();
            if state.draining {
                return;
            }
            let mut count = 0;
            while state.waiters.len() > state.background && state.size() < self.config.max {
                state.creating += 1;
                state.background += 1;
                count += 1;
            }
            count
        };

        for _ in 0..count {
            self.spawn_create(None);
        }
    }

    /// Tops the pool back up to `min` in the background.
    pub(crate) fn ensure_minimum(self: &Arc<Self>) {
        let count = {
            let mut state = self.state.lock();
            if state.draining {
                return;
            }
            let missing = self.config.min.saturating_sub(state.size());
            state.creating += missing;
            state.background += missing;
            missing
        };

        if count > 0 {
            debug!("Topping pool up with {} resources", count);
        }
        for _ in 0..count {
            self.spawn_create(None);
        }
    }

    fn spawn_release(self: &Arc<Self>, entry: Entry<F::Resource>) -> JoinHandle<()> {
        let inner = self.clone();
        tokio::spawn(async move { inner.finish_release(entry).await })
    }

    /// Release path for a handle dropped without an explicit `release`.
    fn release_dropped(self: &Arc<Self>, entry: Entry<F::Resource>) {
        if Handle::try_current().is_ok() {
            debug!("Resource {} dropped without release, returning it", entry.id);
            drop(self.spawn_release(entry));
            return;
        }

        warn!(
            "Resource {} dropped outside a runtime, discarding it without destroy",
            entry.id
        );
        self.state.lock().borrowed.remove(&entry.id);
        self.shrunk.notify_waiters();
    }

    async fn finish_release(self: &Arc<Self>, mut entry: Entry<F::Resource>) {
        if !self.state.lock().borrowed.contains(&entry.id) {
            warn!("Release of unknown resource {} ignored", entry.id);
            return;
        }

        let id = entry.id;
        let cleaned = match AssertUnwindSafe(self.factory.cleanup(&mut entry.resource))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Cleanup of resource {} failed, destroying it: {:#}", id, e);
                self.metrics.validation_failures.increment(1);
                false
            }
            Err(_) => {
                warn!("Factory panicked while cleaning up resource {}, destroying it", id);
                self.metrics.validation_failures.increment(1);
                false
            }
        };

        let doomed = {
            let mut state = self.state.lock();
            state.borrowed.remove(&entry.id);
            if cleaned && !state.draining {
                entry.last_released = Instant::now();
                Self::admit_locked(&mut state, entry);
                None
            } else {
                state.destroying += 1;
                Some(entry)
            }
        };

        match doomed {
            Some(entry) => {
                let reason = if cleaned { "pool draining" } else { "cleanup failed" };
                self.destroy(entry, reason).await;
            }
            None => self.publish_stats(),
        }
    }

    pub(crate) fn spawn_destroy(
        self: &Arc<Self>,
        entry: Entry<F::Resource>,
        reason: &'static str,
    ) -> Option<JoinHandle<()>> {
        match Handle::try_current() {
            Ok(runtime) => {
                let inner = self.clone();
                Some(runtime.spawn(async move { inner.destroy(entry, reason).await }))
            }
            Err(_) => {
                warn!(
                    "No runtime to destroy resource {} ({}), discarding it",
                    entry.id, reason
                );
                self.state.lock().destroying -= 1;
                self.shrunk.notify_waiters();
                None
            }
        }
    }

    /// Destroys an entry already removed from every counter except
    /// `destroying`.
    pub(crate) async fn destroy(self: &Arc<Self>, entry: Entry<F::Resource>, reason: &'static str) {
        let id = entry.id;
        debug!(
            "Destroying resource {} ({}, lent {} times, age {:?})",
            id,
            reason,
            entry.lend_count,
            entry.created_at.elapsed()
        );

        match AssertUnwindSafe(self.factory.destroy(entry.resource))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to destroy resource {}: {:#}", id, e),
            Err(_) => warn!("Factory panicked while destroying resource {}", id),
        }
        self.metrics.resources_destroyed.increment(1);

        self.state.lock().destroying -= 1;
        self.shrunk.notify_waiters();
        self.replenish();
        self.publish_stats();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketKind {
    Creation,
    Queued(u64),
}

/// Claim on a resource that has not arrived yet.
///
/// Dropping an unredeemed ticket withdraws it and returns anything already
/// delivered to the pool.
struct Ticket<F: Factory> {
    inner: Arc<PoolInner<F>>,
    kind: TicketKind,
    rx: oneshot::Receiver<Delivery<F::Resource>>,
    settled: bool,
}

impl<F: Factory> Ticket<F> {
    fn creation(inner: Arc<PoolInner<F>>, rx: oneshot::Receiver<Delivery<F::Resource>>) -> Self {
        Self {
            inner,
            kind: TicketKind::Creation,
            rx,
            settled: false,
        }
    }

    async fn redeem(mut self, deadline: tokio::time::Instant) -> Result<Entry<F::Resource>, PoolError> {
        let outcome = tokio::time::timeout_at(deadline, &mut self.rx).await;
        self.settled = true;

        match outcome {
            Ok(Ok(delivery)) => delivery,
            Ok(Err(_)) => Err(PoolError::Drained),
            Err(_) => match self.withdraw() {
                // Delivered just as the deadline passed.
                Some(delivery) => delivery,
                None => {
                    self.inner.publish_stats();
                    self.inner.metrics.acquire_timeouts.increment(1);
                    debug!("Acquire timed out after {:?}", self.inner.config.acquire_timeout);
                    Err(PoolError::AcquisitionTimeout(self.inner.config.acquire_timeout))
                }
            },
        }
    }

    fn withdraw(&mut self) -> Option<Delivery<F::Resource>> {
        if let TicketKind::Queued(id) = self.kind {
            self.inner.state.lock().waiters.retain(|waiter| waiter.id != id);
        }
        self.rx.close();
        self.rx.try_recv().ok()
    }
}

impl<F: Factory> Drop for Ticket<F> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(Ok(entry)) = self.withdraw() {
            self.inner.return_unused(entry);
        }
    }
}

/// A resource on loan from a [`Pool`].
///
/// Dereferences to the resource. Hand it back with [`Pool::release`];
/// dropping it instead returns it from a background task.
pub struct PooledResource<F: Factory> {
    entry: Option<Entry<F::Resource>>,
    pool: Arc<PoolInner<F>>,
}

impl<F: Factory> PooledResource<F> {
    fn entry(&self) -> &Entry<F::Resource> {
        self.entry.as_ref().expect("pooled resource used after release")
    }

    /// Pool-unique identifier of this resource.
    pub fn id(&self) -> u64 {
        self.entry().id
    }

    /// How many times this resource has been lent out, including now.
    pub fn lend_count(&self) -> u64 {
        self.entry().lend_count
    }

    pub fn created_at(&self) -> Instant {
        self.entry().created_at
    }

    pub fn pool_id(&self) -> Uuid {
        self.pool.id
    }
}

impl<F: Factory> std::fmt::Debug for PooledResource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("PooledResource");
        if let Some(entry) = &self.entry {
            out.field("id", &entry.id).field("lend_count", &entry.lend_count);
        }
        out.field("pool", &self.pool.id).finish()
    }
}

impl<F: Factory> Deref for PooledResource<F> {
    type Target = F::Resource;

    fn deref(&self) -> &F::Resource {
        &self.entry().resource
    }
}

impl<F: Factory> DerefMut for PooledResource<F> {
    fn deref_mut(&mut self) -> &mut F::Resource {
        &mut self
            .entry
            .as_mut()
            .expect("pooled resource used after release")
            .resource
    }
}

impl<F: Factory> Drop for PooledResource<F> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.pool.release_dropped(entry);
        }
    }
}
