//! Offload trait for background task execution.
//!
//! Write-through and stale-while-revalidate refreshes must stay off the
//! response path. The [`Offload`] trait abstracts how those tasks are spawned.

use std::future::Future;

use smol_str::SmolStr;

use crate::CacheKey;

/// Trait for spawning background tasks.
///
/// The primary implementation is `OffloadManager` in the `shelter` crate.
/// Implementors should use `Arc` internally so clones share state.
pub trait Offload: Send + Sync + Clone + 'static {
    /// Spawn a future to be executed in the background.
    ///
    /// `kind` labels the task (e.g. "write_through") for tracing and metrics.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Spawn a future keyed by a cache key.
    ///
    /// Implementations may skip the task while another one with the same key
    /// is still in flight. The default never deduplicates.
    fn spawn_keyed<F>(&self, key: CacheKey, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let _ = key;
        self.spawn("keyed", future);
    }
}

/// Offload that drops every task.
///
/// Useful where background work is not wanted, e.g. when caching is
/// driven externally.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOffload;

impl Offload for DisabledOffload {
    fn spawn<F>(&self, _kind: impl Into<SmolStr>, _future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
    }
}
