use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use shelter_core::{CacheKey, FetchResponse, Raw};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::{
    BackendError, DeleteStatus,
    format::{Format, JsonFormat},
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw storage of named cache generations.
///
/// Writing into a generation that does not exist yet creates it. Concurrent
/// writes to the same key are last-write-wins.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>>;

    async fn write(&self, generation: &str, key: &CacheKey, value: Raw) -> BackendResult<()>;

    async fn remove(&self, generation: &str, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Lists the keys stored in a generation. Unknown generations are empty.
    async fn keys(&self, generation: &str) -> BackendResult<Vec<CacheKey>>;

    /// Lists every existing generation name.
    async fn generations(&self) -> BackendResult<Vec<SmolStr>>;

    /// Deletes a whole generation. Deleting a missing one is not an error.
    async fn drop_generation(&self, generation: &str) -> BackendResult<DeleteStatus>;

    /// Returns the name of this backend, used in logs.
    fn name(&self) -> &str {
        "backend"
    }

    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (*self).read(generation, key).await
    }

    async fn write(&self, generation: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        (*self).write(generation, key, value).await
    }

    async fn remove(&self, generation: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (*self).remove(generation, key).await
    }

    async fn keys(&self, generation: &str) -> BackendResult<Vec<CacheKey>> {
        (*self).keys(generation).await
    }

    async fn generations(&self) -> BackendResult<Vec<SmolStr>> {
        (*self).generations().await
    }

    async fn drop_generation(&self, generation: &str) -> BackendResult<DeleteStatus> {
        (*self).drop_generation(generation).await
    }

    fn name(&self) -> &str {
        (*self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (*self).value_format()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(generation, key).await
    }

    async fn write(&self, generation: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        (**self).write(generation, key, value).await
    }

    async fn remove(&self, generation: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(generation, key).await
    }

    async fn keys(&self, generation: &str) -> BackendResult<Vec<CacheKey>> {
        (**self).keys(generation).await
    }

    async fn generations(&self) -> BackendResult<Vec<SmolStr>> {
        (**self).generations().await
    }

    async fn drop_generation(&self, generation: &str) -> BackendResult<DeleteStatus> {
        (**self).drop_generation(generation).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(generation, key).await
    }

    async fn write(&self, generation: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        (**self).write(generation, key, value).await
    }

    async fn remove(&self, generation: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(generation, key).await
    }

    async fn keys(&self, generation: &str) -> BackendResult<Vec<CacheKey>> {
        (**self).keys(generation).await
    }

    async fn generations(&self) -> BackendResult<Vec<SmolStr>> {
        (**self).generations().await
    }

    async fn drop_generation(&self, generation: &str) -> BackendResult<DeleteStatus> {
        (**self).drop_generation(generation).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

/// Typed response operations on top of [`Backend`].
///
/// `get` and `put` run the snapshot through the backend's value format.
pub trait CacheBackend: Backend {
    fn get(
        &self,
        generation: &str,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<FetchResponse>>> + Send {
        async move {
            match self.read(generation, key).await? {
                Some(raw) => {
                    let response = self.value_format().deserialize(&raw)?;
                    trace!(backend = self.name(), generation, %key, "read hit");
                    Ok(Some(response))
                }
                None => Ok(None),
            }
        }
    }

    fn put(
        &self,
        generation: &str,
        key: &CacheKey,
        response: &FetchResponse,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        async move {
            let raw = self.value_format().serialize(response)?;
            debug!(
                backend = self.name(),
                generation,
                %key,
                bytes = raw.len(),
                "write"
            );
            self.write(generation, key, raw).await
        }
    }

    fn delete(
        &self,
        generation: &str,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<DeleteStatus>> + Send {
        async move { self.remove(generation, key).await }
    }
}

// Explicit CacheBackend implementations for trait objects
impl CacheBackend for &dyn Backend {}

impl CacheBackend for Box<dyn Backend> {}

impl CacheBackend for Arc<dyn Backend + Send + 'static> {}
