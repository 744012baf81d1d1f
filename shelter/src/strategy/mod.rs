//! Strategy executors.
//!
//! Every executor resolves to a [`Served`] response, never to an error.
//! Network failures turn into cache fallbacks or synthesized responses,
//! cache write failures are logged by the background write-through task.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

use http::StatusCode;
use shelter_backend::CacheBackend;
use shelter_core::{CacheKey, FetchRequest, FetchResponse, Offload, ResponseSource, Upstream};
use tracing::warn;

use crate::generation::{CacheHit, GenerationManager};
use crate::metrics;
use crate::selector::Strategy;

/// A response ready to be handed back to the page.
#[derive(Debug, Clone)]
pub struct Served {
    /// The response.
    pub response: FetchResponse,
    /// Where it came from.
    pub source: ResponseSource,
}

impl Served {
    pub(crate) fn network(response: FetchResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    pub(crate) fn synthesized(response: FetchResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Synthesized,
        }
    }
}

impl From<CacheHit> for Served {
    fn from(hit: CacheHit) -> Self {
        Self {
            source: hit.source(),
            response: hit.response,
        }
    }
}

/// Result of handling an intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Respond with this.
    Served(Served),
    /// Let the host perform the request unmodified.
    Bypass(FetchRequest),
}

impl FetchOutcome {
    /// The served response, if the request was intercepted.
    pub fn served(self) -> Option<Served> {
        match self {
            FetchOutcome::Served(served) => Some(served),
            FetchOutcome::Bypass(_) => None,
        }
    }
}

/// Response for a failed network-first request with nothing cached.
pub fn network_unavailable() -> FetchResponse {
    FetchResponse::text(
        StatusCode::REQUEST_TIMEOUT,
        "Network unavailable and no cached copy exists.",
    )
}

/// Response for a cache-first or stale-while-revalidate miss the network
/// could not fill.
pub fn service_unavailable() -> FetchResponse {
    FetchResponse::text(
        StatusCode::SERVICE_UNAVAILABLE,
        "Resource unavailable offline.",
    )
}

/// Runs the caching strategies against the current generations.
pub struct StrategyExecutor<B, U, O> {
    generations: GenerationManager<B, U>,
    upstream: U,
    offload: O,
    offline_fallback: CacheKey,
}

impl<B, U, O> StrategyExecutor<B, U, O>
where
    B: CacheBackend + 'static,
    U: Upstream,
    O: Offload,
{
    /// Creates an executor. `offline_fallback` is the key of the document
    /// served for failed navigations.
    pub fn new(
        generations: GenerationManager<B, U>,
        upstream: U,
        offload: O,
        offline_fallback: CacheKey,
    ) -> Self {
        Self {
            generations,
            upstream,
            offload,
            offline_fallback,
        }
    }

    /// Generations the executor reads and writes.
    pub fn generations(&self) -> &GenerationManager<B, U> {
        &self.generations
    }

    /// Spawner of write-through and revalidation tasks.
    pub fn offload(&self) -> &O {
        &self.offload
    }

    /// Runs the given strategy.
    pub async fn execute(&self, strategy: Strategy, request: FetchRequest) -> FetchOutcome {
        let served = match strategy {
            Strategy::Bypass => return FetchOutcome::Bypass(request),
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        };
        FetchOutcome::Served(served)
    }

    /// Stores a fresh network response in the dynamic generation in the
    /// background. Responses that are not cacheable are ignored.
    fn write_through(&self, key: CacheKey, response: &FetchResponse) {
        if !response.is_cacheable() {
            return;
        }
        let generations = self.generations.clone();
        let response = response.clone();
        self.offload.spawn("write_through", async move {
            if let Err(error) = generations.store_dynamic(&key, &response).await {
                warn!(%key, %error, "write-through failed");
                metrics::write_failure();
            }
        });
    }
}
