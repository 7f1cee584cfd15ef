//! The create/destroy/validate contract the pool drives.

use async_trait::async_trait;

/// Supplies the expensive resources a [`Pool`](crate::Pool) lends out.
///
/// The pool calls these methods outside of its bookkeeping lock, so each of
/// them may take as long as it needs. `create` in particular can take
/// seconds for a real browser launch.
#[async_trait]
pub trait Factory: Send + Sync + 'static {
    /// The pooled resource, e.g. a running browser process.
    type Resource: Send + 'static;

    /// Produces a new resource. Must not be assumed idempotent or cheap.
    async fn create(&self) -> anyhow::Result<Self::Resource>;

    /// Tears a resource down. Called on unhealthy resources too; an error
    /// is logged and the resource is forgotten anyway.
    async fn destroy(&self, resource: Self::Resource) -> anyhow::Result<()>;

    /// Fast liveness probe.
    async fn validate(&self, resource: &Self::Resource) -> bool;

    /// Runs before a released resource goes back into service, e.g. to close
    /// whatever the last task left open. An error destroys the resource
    /// instead of re-pooling it.
    async fn cleanup(&self, _resource: &mut Self::Resource) -> anyhow::Result<()> {
        Ok(())
    }
}
