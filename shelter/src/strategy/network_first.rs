use shelter_backend::CacheBackend;
use shelter_core::{FetchRequest, Offload, ResponseSource, Upstream};
use tracing::debug;

use super::{Served, StrategyExecutor, network_unavailable};
use crate::metrics;

impl<B, U, O> StrategyExecutor<B, U, O>
where
    B: CacheBackend + 'static,
    U: Upstream,
    O: Offload,
{
    /// Fetch from the network, fall back to the cache when it fails.
    ///
    /// Any network response, whatever its status, is returned as-is; only
    /// `200 OK` is written through. On a network failure the generations are
    /// searched, then navigations get the offline fallback document, and
    /// everything else a synthesized `408`.
    pub async fn network_first(&self, request: FetchRequest) -> Served {
        let key = request.cache_key();
        let is_navigation = request.is_navigation();

        let error = match self.upstream.call(request).await {
            Ok(response) => {
                if let Some(key) = key {
                    self.write_through(key, &response);
                }
                return Served::network(response);
            }
            Err(error) => error,
        };

        debug!(%error, "network failed, trying cache");
        metrics::network_fallback("network_first");

        if let Some(key) = &key
            && let Ok(hit) = self.generations.lookup(key).await
        {
            return hit.into();
        }

        if is_navigation && let Ok(hit) = self.generations.lookup(&self.offline_fallback).await {
            debug!(fallback = %self.offline_fallback, "serving offline fallback document");
            return Served {
                response: hit.response,
                source: ResponseSource::OfflineFallback,
            };
        }

        Served::synthesized(network_unavailable())
    }
}
