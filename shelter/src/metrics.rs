//! Metrics declaration and recording helpers.
//!
//! With the `metrics` feature disabled every helper compiles to nothing.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of lookups answered from a generation.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shelter_cache_hit_total",
            "Total number of lookups answered from a cache generation."
        );
        "shelter_cache_hit_total"
    };
    /// Track number of lookups that found nothing.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shelter_cache_miss_total",
            "Total number of lookups that found no cached entry."
        );
        "shelter_cache_miss_total"
    };
    /// Track number of network failures recovered by a fallback.
    pub static ref NETWORK_FALLBACK_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shelter_network_fallback_total",
            "Total number of network failures handled by a fallback."
        );
        "shelter_network_fallback_total"
    };
    /// Track number of failed write-through attempts.
    pub static ref WRITE_FAILURE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shelter_write_failure_total",
            "Total number of write-through attempts that failed."
        );
        "shelter_write_failure_total"
    };
    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_spawned_total",
            "Total number of background tasks spawned."
        );
        "shelter_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks finished.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_completed_total",
            "Total number of background tasks finished."
        );
        "shelter_offload_tasks_completed_total"
    };
    /// Track number of offload tasks skipped because one was in flight.
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_deduplicated_total",
            "Total number of background tasks skipped as duplicates."
        );
        "shelter_offload_tasks_deduplicated_total"
    };
}

#[inline]
pub(crate) fn cache_hit(generation: &str) {
    #[cfg(feature = "metrics")]
    metrics::counter!(*CACHE_HIT_COUNTER, "generation" => generation.to_owned()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = generation;
}

#[inline]
pub(crate) fn cache_miss() {
    #[cfg(feature = "metrics")]
    metrics::counter!(*CACHE_MISS_COUNTER).increment(1);
}

#[inline]
pub(crate) fn network_fallback(strategy: &'static str) {
    #[cfg(feature = "metrics")]
    metrics::counter!(*NETWORK_FALLBACK_COUNTER, "strategy" => strategy).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = strategy;
}

#[inline]
pub(crate) fn write_failure() {
    #[cfg(feature = "metrics")]
    metrics::counter!(*WRITE_FAILURE_COUNTER).increment(1);
}

#[inline]
pub(crate) fn offload_spawned(kind: &str) {
    #[cfg(feature = "metrics")]
    metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => kind.to_owned()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

#[inline]
pub(crate) fn offload_completed(kind: &str) {
    #[cfg(feature = "metrics")]
    metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "kind" => kind.to_owned()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

#[inline]
pub(crate) fn offload_deduplicated() {
    #[cfg(feature = "metrics")]
    metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED).increment(1);
}
