use shelter_backend::CacheBackend;
use shelter_core::{CacheKey, FetchRequest, Offload, Upstream};
use tracing::{debug, warn};

use super::{Served, StrategyExecutor, service_unavailable};
use crate::metrics;

impl<B, U, O> StrategyExecutor<B, U, O>
where
    B: CacheBackend + 'static,
    U: Upstream,
    O: Offload,
{
    /// Serve the cached copy at once and refresh it in the background.
    ///
    /// On a miss the network response is awaited and written through. A
    /// network failure on a miss yields the synthesized `503`.
    pub async fn stale_while_revalidate(&self, request: FetchRequest) -> Served {
        let key = request.cache_key();
        if let Some(key) = &key
            && let Ok(hit) = self.generations.lookup(key).await
        {
            self.revalidate(key.clone(), request);
            return hit.into();
        }

        match self.upstream.call(request).await {
            Ok(response) => {
                if let Some(key) = key {
                    self.write_through(key, &response);
                }
                Served::network(response)
            }
            Err(error) => {
                debug!(%error, "network failed on cache miss");
                metrics::network_fallback("stale_while_revalidate");
                Served::synthesized(service_unavailable())
            }
        }
    }

    /// Refreshes the dynamic entry for `key`. At most one refresh per key is
    /// in flight; failures are logged and dropped.
    fn revalidate(&self, key: CacheKey, request: FetchRequest) {
        let upstream = self.upstream.clone();
        let generations = self.generations.clone();
        self.offload.spawn_keyed(key.clone(), async move {
            match upstream.call(request).await {
                Ok(response) => {
                    if let Err(error) = generations.store_dynamic(&key, &response).await {
                        warn!(%key, %error, "revalidation write failed");
                        metrics::write_failure();
                    }
                }
                Err(error) => warn!(%key, %error, "background revalidation failed"),
            }
        });
    }
}
