//! Cache generation lifecycle.
//!
//! Two generations are current at any time: the *static* one, filled once
//! from the pre-cache manifest at install, and the *dynamic* one, filled by
//! write-through while requests are served. Every other generation in the
//! backend is garbage and goes away at activation.
//!
//! Lookups read the dynamic generation first and fall back to the static
//! one, so a fresh network copy of a pre-cached asset wins over the copy
//! taken at install.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use shelter_backend::{CacheBackend, DeleteStatus};
use shelter_core::{CacheKey, FetchError, FetchRequest, FetchResponse, ResponseSource, Upstream};
use smol_str::{SmolStr, format_smolstr};
use tracing::{debug, info, warn};
use url::Url;

use crate::clients::Clients;
use crate::error::{CacheError, PopulationFailure};
use crate::metrics;

/// Names of the two current generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationNames {
    /// Generation populated from the pre-cache manifest.
    pub static_name: SmolStr,
    /// Generation populated by write-through.
    pub dynamic_name: SmolStr,
}

impl GenerationNames {
    /// `{version}-static` and `{version}-dynamic`.
    pub fn for_version(version: &str) -> Self {
        Self {
            static_name: format_smolstr!("{version}-static"),
            dynamic_name: format_smolstr!("{version}-dynamic"),
        }
    }

    /// Both names as a set, the input of [`GenerationManager::reclaim`].
    pub fn current(&self) -> HashSet<SmolStr> {
        HashSet::from([self.static_name.clone(), self.dynamic_name.clone()])
    }

    /// Current names in lookup order.
    pub fn lookup_order(&self) -> [&SmolStr; 2] {
        [&self.dynamic_name, &self.static_name]
    }
}

/// A stored response together with the generation it was read from.
#[derive(Debug, Clone)]
pub struct CacheHit {
    /// Generation holding the entry.
    pub generation: SmolStr,
    /// The stored snapshot.
    pub response: FetchResponse,
}

impl CacheHit {
    /// Provenance to report for this hit.
    pub fn source(&self) -> ResponseSource {
        ResponseSource::Cache {
            generation: self.generation.clone(),
        }
    }
}

/// Owns the static and dynamic generations of one deployment version.
pub struct GenerationManager<B, U> {
    backend: Arc<B>,
    upstream: U,
    names: GenerationNames,
}

impl<B, U: Clone> Clone for GenerationManager<B, U> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            upstream: self.upstream.clone(),
            names: self.names.clone(),
        }
    }
}

impl<B, U> GenerationManager<B, U>
where
    B: CacheBackend + 'static,
    U: Upstream,
{
    /// Creates a manager for the given generation names.
    pub fn new(backend: Arc<B>, upstream: U, names: GenerationNames) -> Self {
        Self {
            backend,
            upstream,
            names,
        }
    }

    /// Current generation names.
    pub fn names(&self) -> &GenerationNames {
        &self.names
    }

    /// Underlying storage.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Fetches every manifest URL and stores it in the static generation.
    ///
    /// Fetches run concurrently. Only `200 OK` responses are stored, any other
    /// status counts as a failure. Returns the number of stored entries, or
    /// [`CacheError::PartialPopulation`] when at least one entry failed. The
    /// successful entries stay stored in that case.
    #[tracing::instrument(
        name = "shelter.populate",
        skip_all,
        fields(generation = %self.names.static_name, entries = manifest.len())
    )]
    pub async fn populate_static(&self, manifest: &[Url]) -> Result<usize, CacheError> {
        let results = join_all(manifest.iter().map(|url| self.precache(url.clone()))).await;

        let mut cached = 0;
        let mut failed = Vec::new();
        for (url, result) in manifest.iter().zip(results) {
            match result {
                Ok(()) => cached += 1,
                Err(error) => {
                    warn!(%url, %error, "pre-cache failed");
                    failed.push(PopulationFailure {
                        url: url.clone(),
                        error: Box::new(error),
                    });
                }
            }
        }

        if failed.is_empty() {
            info!(cached, "static generation populated");
            Ok(cached)
        } else {
            Err(CacheError::PartialPopulation { cached, failed })
        }
    }

    async fn precache(&self, url: Url) -> Result<(), CacheError> {
        let key = CacheKey::get(&url);
        let response = self.upstream.call(FetchRequest::get(url)).await?;
        if !response.is_cacheable() {
            return Err(FetchError::Status(response.status()).into());
        }
        self.backend
            .put(&self.names.static_name, &key, &response)
            .await?;
        Ok(())
    }

    /// Deletes every generation whose name is not in `current`.
    ///
    /// Never fails: listing or deletion errors are logged and the affected
    /// generations are left for the next activation. Returns the names that
    /// were deleted, so a repeated call with the same set returns nothing.
    #[tracing::instrument(name = "shelter.reclaim", skip_all)]
    pub async fn reclaim(&self, current: &HashSet<SmolStr>) -> Vec<SmolStr> {
        let existing = match self.backend.generations().await {
            Ok(existing) => existing,
            Err(error) => {
                warn!(%error, "listing generations failed");
                return Vec::new();
            }
        };

        let stale: Vec<SmolStr> = existing
            .into_iter()
            .filter(|name| !current.contains(name))
            .collect();
        let results = join_all(
            stale
                .iter()
                .map(|name| self.backend.drop_generation(name.as_str())),
        )
        .await;

        let mut deleted = Vec::with_capacity(stale.len());
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(DeleteStatus::Deleted(entries)) => {
                    info!(generation = %name, entries, "deleted stale generation");
                    deleted.push(name);
                }
                Ok(DeleteStatus::Missing) => {
                    debug!(generation = %name, "stale generation already gone");
                }
                Err(error) => {
                    warn!(generation = %name, %error, "deleting stale generation failed");
                }
            }
        }
        deleted
    }

    /// Hands every already-open page over to this deployment.
    ///
    /// Call only after [`reclaim`](Self::reclaim) has completed, or use
    /// [`activate`](Self::activate) which enforces the order.
    pub async fn claim_immediately<C: Clients + ?Sized>(&self, clients: &C) {
        clients.claim().await;
        debug!("clients claimed");
    }

    /// Reclaims stale generations, then claims open pages.
    pub async fn activate<C: Clients + ?Sized>(&self, clients: &C) -> Vec<SmolStr> {
        let deleted = self.reclaim(&self.names.current()).await;
        self.claim_immediately(clients).await;
        deleted
    }

    /// Deletes every generation, current ones included.
    pub async fn clear(&self) -> Vec<SmolStr> {
        self.reclaim(&HashSet::new()).await
    }

    /// Looks the key up in the dynamic generation, then the static one.
    ///
    /// Read errors are logged and treated like a miss.
    pub async fn lookup(&self, key: &CacheKey) -> Result<CacheHit, CacheError> {
        for generation in self.names.lookup_order() {
            match self.backend.get(generation, key).await {
                Ok(Some(response)) => {
                    debug!(%key, %generation, "cache hit");
                    metrics::cache_hit(generation);
                    return Ok(CacheHit {
                        generation: generation.clone(),
                        response,
                    });
                }
                Ok(None) => {}
                Err(error) => warn!(%key, %generation, %error, "cache read failed"),
            }
        }
        debug!(%key, "cache miss");
        metrics::cache_miss();
        Err(CacheError::Miss(key.clone()))
    }

    /// Writes a network response into the dynamic generation.
    ///
    /// Non-`GET` keys and responses other than `200 OK` are skipped.
    pub async fn store_dynamic(
        &self,
        key: &CacheKey,
        response: &FetchResponse,
    ) -> Result<(), CacheError> {
        if !key.is_get() || !response.is_cacheable() {
            debug!(%key, status = %response.status(), "not cacheable, skipping write");
            return Ok(());
        }
        self.backend
            .put(&self.names.dynamic_name, key, response)
            .await?;
        Ok(())
    }
}
