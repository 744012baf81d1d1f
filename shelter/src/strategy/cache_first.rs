use shelter_backend::CacheBackend;
use shelter_core::{FetchRequest, Offload, Upstream};
use tracing::debug;

use super::{Served, StrategyExecutor, service_unavailable};
use crate::metrics;

impl<B, U, O> StrategyExecutor<B, U, O>
where
    B: CacheBackend + 'static,
    U: Upstream,
    O: Offload,
{
    /// Serve from the cache, go to the network only on a miss.
    ///
    /// A network response that cannot be cached (anything but `200 OK`) is
    /// treated as a failure: the page gets the synthesized `503` instead of,
    /// say, a `404` for an image.
    pub async fn cache_first(&self, request: FetchRequest) -> Served {
        let key = request.cache_key();
        if let Some(key) = &key
            && let Ok(hit) = self.generations.lookup(key).await
        {
            return hit.into();
        }

        match self.upstream.call(request).await {
            Ok(response) if response.is_cacheable() => {
                if let Some(key) = key {
                    self.write_through(key, &response);
                }
                Served::network(response)
            }
            Ok(response) => {
                debug!(status = %response.status(), "uncacheable response on cache miss");
                metrics::network_fallback("cache_first");
                Served::synthesized(service_unavailable())
            }
            Err(error) => {
                debug!(%error, "network failed on cache miss");
                metrics::network_fallback("cache_first");
                Served::synthesized(service_unavailable())
            }
        }
    }
}
