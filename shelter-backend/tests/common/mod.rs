//! Simple in-memory test backend implementation using DashMap.

use async_trait::async_trait;
use dashmap::DashMap;
use shelter_backend::{Backend, BackendResult, CacheBackend, DeleteStatus};
use shelter_core::{CacheKey, Raw, SmolStr};
use std::sync::Arc;

/// Simple in-memory backend for testing using DashMap.
#[derive(Clone, Default)]
pub struct TestBackend {
    store: Arc<DashMap<SmolStr, DashMap<CacheKey, Raw>>>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw serialized value for inspection.
    pub fn get_raw(&self, generation: &str, key: &CacheKey) -> Option<Raw> {
        self.store
            .get(generation)
            .and_then(|entries| entries.get(key).map(|v| v.clone()))
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        Ok(self.get_raw(generation, key))
    }

    async fn write(&self, generation: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        self.store
            .entry(SmolStr::new(generation))
            .or_default()
            .insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, generation: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let removed = self
            .store
            .get(generation)
            .and_then(|entries| entries.remove(key));
        Ok(match removed {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn keys(&self, generation: &str) -> BackendResult<Vec<CacheKey>> {
        Ok(self
            .store
            .get(generation)
            .map(|entries| entries.iter().map(|e| e.key().clone()).collect())
            .unwrap_or_default())
    }

    async fn generations(&self) -> BackendResult<Vec<SmolStr>> {
        Ok(self.store.iter().map(|e| e.key().clone()).collect())
    }

    async fn drop_generation(&self, generation: &str) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(generation) {
            Some((_, entries)) => DeleteStatus::Deleted(entries.len() as u32),
            None => DeleteStatus::Missing,
        })
    }

    fn name(&self) -> &str {
        "test"
    }
}

impl CacheBackend for TestBackend {}
