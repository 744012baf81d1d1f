//! Moka backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use shelter_backend::format::{Format, JsonFormat};
use shelter_backend::{Backend, BackendResult, DeleteStatus};
use shelter_core::{CacheKey, Raw};
use smol_str::SmolStr;
use tracing::debug;

use crate::builder::GenerationFactory;

/// In-memory generation storage powered by Moka.
///
/// Each generation name maps to its own `moka::future::Cache`, created on the
/// first write. Capacity and eviction policy apply per generation.
///
/// # Caveats
///
/// - Data is **not persisted**, generations are lost on process restart
/// - Capacity eviction is **best-effort**: a full generation may silently
///   drop entries, which the caching layer then sees as plain misses
#[derive(Clone)]
pub struct MokaBackend<S = JsonFormat>
where
    S: Format,
{
    generations: Arc<DashMap<SmolStr, Cache<CacheKey, Raw>>>,
    factory: GenerationFactory,
    serializer: S,
    label: SmolStr,
}

impl<S> std::fmt::Debug for MokaBackend<S>
where
    S: Format,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("generations", &self.generations.len())
            .field("serializer", &self.serializer.name())
            .finish()
    }
}

impl MokaBackend<JsonFormat> {
    /// Creates a new builder for `MokaBackend`.
    pub fn builder() -> crate::builder::MokaBackendBuilder<crate::builder::NoCapacity, JsonFormat>
    {
        crate::builder::MokaBackendBuilder::new()
    }
}

impl<S> MokaBackend<S>
where
    S: Format,
{
    pub(crate) fn from_parts(factory: GenerationFactory, serializer: S, label: SmolStr) -> Self {
        MokaBackend {
            generations: Arc::new(DashMap::new()),
            factory,
            serializer,
            label,
        }
    }

    /// Returns the cache backing a generation, if it exists.
    pub fn generation(&self, name: &str) -> Option<Cache<CacheKey, Raw>> {
        self.generations.get(name).map(|cache| cache.clone())
    }

    /// Returns the cache backing a generation, creating it if needed.
    fn open(&self, name: &str) -> Cache<CacheKey, Raw> {
        self.generations
            .entry(SmolStr::new(name))
            .or_insert_with(|| {
                debug!(backend = %self.label, generation = name, "open generation");
                self.factory.build()
            })
            .clone()
    }
}

#[async_trait]
impl<S> Backend for MokaBackend<S>
where
    S: Format + Send + Sync,
{
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        match self.generation(generation) {
            Some(cache) => Ok(cache.get(key).await),
            None => Ok(None),
        }
    }

    async fn write(&self, generation: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        self.open(generation).insert(key.clone(), value).await;
        Ok(())
    }

    async fn remove(&self, generation: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let removed = match self.generation(generation) {
            Some(cache) => cache.remove(key).await,
            None => None,
        };
        Ok(match removed {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn keys(&self, generation: &str) -> BackendResult<Vec<CacheKey>> {
        Ok(self
            .generation(generation)
            .map(|cache| cache.iter().map(|(key, _)| (*key).clone()).collect())
            .unwrap_or_default())
    }

    async fn generations(&self) -> BackendResult<Vec<SmolStr>> {
        Ok(self
            .generations
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn drop_generation(&self, generation: &str) -> BackendResult<DeleteStatus> {
        match self.generations.remove(generation) {
            Some((_, cache)) => {
                let entries = cache.iter().count();
                cache.invalidate_all();
                Ok(DeleteStatus::Deleted(entries as u32))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}

impl<S> shelter_backend::CacheBackend for MokaBackend<S> where S: Format + Send + Sync {}
