//! Shared test doubles: in-memory backends, a scripted network and a
//! recording page host.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use http::StatusCode;
use shelter::Clients;
use shelter_backend::{Backend, BackendError, BackendResult, CacheBackend, DeleteStatus};
use shelter_core::{CacheKey, FetchError, FetchRequest, FetchResponse, Raw, SmolStr, Upstream};
use url::Url;

pub const SCOPE: &str = "https://app.example/";

/// Routes shelter logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn url(path: &str) -> Url {
    Url::parse(SCOPE).unwrap().join(path).unwrap()
}

pub fn ok(body: &'static str) -> FetchResponse {
    FetchResponse::text(StatusCode::OK, body)
}

// =============================================================================
// Backends
// =============================================================================

/// In-memory backend keyed by generation name.
#[derive(Clone, Default)]
pub struct TestBackend {
    store: Arc<DashMap<SmolStr, DashMap<CacheKey, Raw>>>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation names, sorted.
    pub fn generation_names(&self) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = self.store.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self, generation: &str) -> usize {
        self.store.get(generation).map(|e| e.len()).unwrap_or(0)
    }

    pub fn contains(&self, generation: &str, key: &CacheKey) -> bool {
        self.store
            .get(generation)
            .is_some_and(|entries| entries.contains_key(key))
    }

    /// Creates an empty generation, as a previous deployment would have.
    pub fn seed_generation(&self, generation: &str) {
        self.store.entry(SmolStr::new(generation)).or_default();
    }

    /// Stores a response directly, bypassing the value format.
    pub async fn seed(&self, generation: &str, key: &CacheKey, response: &FetchResponse) {
        self.put(generation, key, response).await.unwrap();
    }

    /// Reads a stored response back.
    pub async fn stored(&self, generation: &str, key: &CacheKey) -> Option<FetchResponse> {
        self.get(generation, key).await.unwrap()
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        Ok(self
            .store
            .get(generation)
            .and_then(|entries| entries.get(key).map(|v| v.clone())))
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

/// Backend whose writes always fail with a quota error.
#[derive(Clone, Default)]
pub struct FullBackend {
    inner: TestBackend,
    rejected: Arc<AtomicUsize>,
}

impl FullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads go through this one.
    pub fn inner(&self) -> &TestBackend {
        &self.inner
    }

    pub fn rejected_writes(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FullBackend {
    async fn read(&self, generation: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        self.inner.read(generation, key).await
    }

    async fn write(&self, generation: &str, _key: &CacheKey, _value: Raw) -> BackendResult<()> {
        self.rejected.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::QuotaExceeded {
            generation: generation.to_owned(),
        })
    }

    async fn remove(&self, generation: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        self.inner.remove(generation, key).await
    }

    async fn keys(&self, generation: &str) -> BackendResult<Vec<CacheKey>> {
        self.inner.keys(generation).await
    }

    async fn generations(&self) -> BackendResult<Vec<SmolStr>> {
        self.inner.generations().await
    }

    async fn drop_generation(&self, generation: &str) -> BackendResult<DeleteStatus> {
        self.inner.drop_generation(generation).await
    }

    fn name(&self) -> &str {
        "full"
    }
}

impl CacheBackend for FullBackend {}

// =============================================================================
// Network
// =============================================================================

#[derive(Clone)]
enum Reply {
    Respond(FetchResponse),
    Fail,
}

#[derive(Default)]
struct MockState {
    replies: DashMap<Url, Reply>,
    calls: DashMap<Url, usize>,
    total: AtomicUsize,
    offline: std::sync::atomic::AtomicBool,
}

/// Scripted network. Unscripted URLs answer `404`.
#[derive(Clone, Default)]
pub struct MockUpstream {
    state: Arc<MockState>,
    latency: Option<Duration>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn respond(&self, url: Url, response: FetchResponse) -> &Self {
        self.state.replies.insert(url, Reply::Respond(response));
        self
    }

    pub fn fail(&self, url: Url) -> &Self {
        self.state.replies.insert(url, Reply::Fail);
        self
    }

    /// Makes every call fail regardless of the script.
    pub fn go_offline(&self) {
        self.state.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.state.offline.store(false, Ordering::SeqCst);
    }

    pub fn total_calls(&self) -> usize {
        self.state.total.load(Ordering::SeqCst)
    }

    pub fn calls(&self, url: &Url) -> usize {
        self.state.calls.get(url).map(|c| *c).unwrap_or(0)
    }
}

impl Upstream for MockUpstream {
    type Future = BoxFuture<'static, Result<FetchResponse, FetchError>>;

    fn call(&self, req: FetchRequest) -> Self::Future {
        self.state.total.fetch_add(1, Ordering::SeqCst);
        *self.state.calls.entry(req.url.clone()).or_insert(0) += 1;

        let reply = if self.state.offline.load(Ordering::SeqCst) {
            Reply::Fail
        } else {
            self.state
                .replies
                .get(&req.url)
                .map(|r| r.clone())
                .unwrap_or_else(|| {
                    Reply::Respond(FetchResponse::text(StatusCode::NOT_FOUND, "not found"))
                })
        };
        let latency = self.latency;

        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            match reply {
                Reply::Respond(response) => Ok(response),
                Reply::Fail => Err(FetchError::network(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "offline",
                ))),
            }
        })
    }
}

// =============================================================================
// Page host
// =============================================================================

/// Records host calls. When observing a backend, also records which
/// generations existed at the moment pages were claimed.
#[derive(Clone, Default)]
pub struct RecordingClients {
    calls: Arc<Mutex<Vec<&'static str>>>,
    observed: Option<TestBackend>,
    at_claim: Arc<Mutex<Option<Vec<SmolStr>>>>,
}

impl RecordingClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observing(backend: TestBackend) -> Self {
        Self {
            observed: Some(backend),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn generations_at_claim(&self) -> Option<Vec<SmolStr>> {
        self.at_claim.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clients for RecordingClients {
    async fn claim(&self) {
        if let Some(backend) = &self.observed {
            *self.at_claim.lock().unwrap() = Some(backend.generation_names());
        }
        self.calls.lock().unwrap().push("claim");
    }

    async fn skip_waiting(&self) {
        self.calls.lock().unwrap().push("skip_waiting");
    }
}
