//! Host-side control over the pages this worker serves.

use async_trait::async_trait;

/// Operations the host runtime performs on behalf of the worker.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Start controlling every already-open page without a reload.
    async fn claim(&self);

    /// Activate this worker without waiting for older pages to close.
    async fn skip_waiting(&self);
}

/// Host without pages to control, e.g. a headless proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClients;

#[async_trait]
impl Clients for NoopClients {
    async fn claim(&self) {}

    async fn skip_waiting(&self) {}
}
