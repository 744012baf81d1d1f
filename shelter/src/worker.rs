//! The long-lived request dispatcher.
//!
//! A [`Worker`] is built once at startup and answers four kinds of events
//! for as long as the host keeps it alive. It keeps no state between events
//! beyond its configuration: everything that must survive lives in the
//! backend.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use shelter_backend::CacheBackend;
use shelter_core::{CacheKey, FetchRequest, Offload, Upstream};
use smol_str::SmolStr;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

use crate::clients::Clients;
use crate::config::WorkerConfig;
use crate::error::{CacheError, ConfigError};
use crate::generation::GenerationManager;
use crate::message::{ControlMessage, MessageEvent, MessageOutcome};
use crate::offload::{OffloadConfig, OffloadManager};
use crate::selector::{RouteRules, Strategy};
use crate::strategy::{FetchOutcome, StrategyExecutor};

/// Event kinds the worker handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// New deployment installing.
    Install,
    /// New deployment taking over.
    Activate,
    /// Intercepted request.
    Fetch,
    /// Control message from a page.
    Message,
}

impl EventKind {
    /// Host-side event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Install => "install",
            EventKind::Activate => "activate",
            EventKind::Fetch => "fetch",
            EventKind::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered by the host runtime.
#[derive(Debug)]
pub enum Event {
    /// Populate the static generation.
    Install,
    /// Reclaim stale generations and claim open pages.
    Activate,
    /// Answer an intercepted request.
    Fetch(FetchRequest),
    /// Handle a page command.
    Message(MessageEvent),
}

impl Event {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Install => EventKind::Install,
            Event::Activate => EventKind::Activate,
            Event::Fetch(_) => EventKind::Fetch,
            Event::Message(_) => EventKind::Message,
        }
    }
}

/// Outcome of the install event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Manifest entries stored.
    pub cached: usize,
    /// Manifest entries that could not be stored.
    pub failed: Vec<Url>,
}

impl InstallReport {
    /// `true` when every manifest entry was stored.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of dispatching one event.
#[derive(Debug)]
pub enum EventOutcome {
    /// Install finished, possibly with a degraded static generation.
    Installed(InstallReport),
    /// Activation finished; these generations were deleted.
    Activated(Vec<SmolStr>),
    /// Intercepted request answered or passed through.
    Fetch(FetchOutcome),
    /// Control message handled.
    Message(MessageOutcome),
}

struct WorkerInner<B, U, C, O> {
    config: WorkerConfig,
    manifest: Vec<Url>,
    rules: RouteRules,
    executor: StrategyExecutor<B, U, O>,
    clients: C,
}

/// Dispatcher holding the generation manager, selector and executors.
///
/// Cheap to clone; clones share everything.
pub struct Worker<B, U, C, O = OffloadManager> {
    inner: Arc<WorkerInner<B, U, C, O>>,
}

impl<B, U, C, O> Clone for Worker<B, U, C, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, U, C> Worker<B, U, C, OffloadManager>
where
    B: CacheBackend + 'static,
    U: Upstream,
    C: Clients + 'static,
{
    /// Builds a worker with an [`OffloadManager`] configured from `config`.
    pub fn new(config: WorkerConfig, backend: B, upstream: U, clients: C) -> Result<Self, ConfigError> {
        let offload = OffloadManager::new(OffloadConfig::from(&config));
        Self::with_offload(config, backend, upstream, clients, offload)
    }
}

impl<B, U, C, O> Worker<B, U, C, O>
where
    B: CacheBackend + 'static,
    U: Upstream,
    C: Clients + 'static,
    O: Offload,
{
    /// Events this worker registers for.
    pub const EVENTS: [EventKind; 4] = [
        EventKind::Install,
        EventKind::Activate,
        EventKind::Fetch,
        EventKind::Message,
    ];

    /// Builds a worker with a custom background task spawner.
    ///
    /// Fails when a manifest URL, the fallback URL or a route pattern is
    /// invalid.
    pub fn with_offload(
        config: WorkerConfig,
        backend: B,
        upstream: U,
        clients: C,
        offload: O,
    ) -> Result<Self, ConfigError> {
        let manifest = config.manifest()?;
        let offline_fallback = CacheKey::get(&config.offline_fallback_url()?);
        let rules = RouteRules::from_config(&config.routes)?;
        let generations =
            GenerationManager::new(Arc::new(backend), upstream.clone(), config.generation_names());
        let executor = StrategyExecutor::new(generations, upstream, offload, offline_fallback);

        Ok(Self {
            inner: Arc::new(WorkerInner {
                config,
                manifest,
                rules,
                executor,
                clients,
            }),
        })
    }

    /// Worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    /// Generation manager of the current deployment.
    pub fn generations(&self) -> &GenerationManager<B, U> {
        self.inner.executor.generations()
    }

    /// Spawner of background cache writes.
    pub fn offload(&self) -> &O {
        self.inner.executor.offload()
    }

    /// Current static generation name, the answer to `GET_VERSION`.
    pub fn version(&self) -> &SmolStr {
        &self.generations().names().static_name
    }

    /// Chooses the strategy for a request without executing it.
    pub fn classify(&self, request: &FetchRequest) -> Strategy {
        self.inner.rules.select(request)
    }

    /// Routes an event to its handler.
    ///
    /// The returned future owns a handle to the worker and can be driven by
    /// any executor the host uses.
    pub fn dispatch(&self, event: Event) -> BoxFuture<'static, EventOutcome> {
        let worker = self.clone();
        match event {
            Event::Install => Box::pin(async move { EventOutcome::Installed(worker.install().await) }),
            Event::Activate => {
                Box::pin(async move { EventOutcome::Activated(worker.activate().await) })
            }
            Event::Fetch(request) => {
                Box::pin(async move { EventOutcome::Fetch(worker.fetch(request).await) })
            }
            Event::Message(message) => {
                Box::pin(async move { EventOutcome::Message(worker.message(message).await) })
            }
        }
    }

    /// Populates the static generation, then optionally skips waiting.
    ///
    /// A partially populated generation is logged and accepted.
    pub async fn install(&self) -> InstallReport {
        let report = match self
            .generations()
            .populate_static(&self.inner.manifest)
            .await
        {
            Ok(cached) => InstallReport {
                cached,
                failed: Vec::new(),
            },
            Err(CacheError::PartialPopulation { cached, failed }) => {
                warn!(
                    cached,
                    failed = failed.len(),
                    "static generation partially populated"
                );
                InstallReport {
                    cached,
                    failed: failed.into_iter().map(|failure| failure.url).collect(),
                }
            }
            Err(error) => {
                warn!(%error, "static generation population failed");
                InstallReport {
                    cached: 0,
                    failed: self.inner.manifest.clone(),
                }
            }
        };

        if self.inner.config.skip_waiting_on_install {
            self.inner.clients.skip_waiting().await;
        }
        info!(version = %self.version(), cached = report.cached, "installed");
        report
    }

    /// Deletes stale generations, then claims open pages.
    pub async fn activate(&self) -> Vec<SmolStr> {
        let deleted = self.generations().activate(&self.inner.clients).await;
        info!(version = %self.version(), deleted = deleted.len(), "activated");
        deleted
    }

    /// Classifies and answers an intercepted request.
    pub async fn fetch(&self, request: FetchRequest) -> FetchOutcome {
        let strategy = self.classify(&request);
        let span = info_span!(
            "shelter.fetch",
            strategy = %strategy,
            url = %request.url,
        );
        self.inner
            .executor
            .execute(strategy, request)
            .instrument(span)
            .await
    }

    /// Handles a control message from a page.
    pub async fn message(&self, event: MessageEvent) -> MessageOutcome {
        match event.message {
            ControlMessage::SkipWaiting => {
                self.inner.clients.skip_waiting().await;
                MessageOutcome::SkippedWaiting
            }
            ControlMessage::ClearCache => {
                let deleted = self.generations().clear().await;
                info!(deleted = deleted.len(), "all generations cleared");
                MessageOutcome::Cleared(deleted)
            }
            ControlMessage::GetVersion => {
                let version = self.version().clone();
                if let Some(reply) = event.reply
                    && reply.send(version.clone()).is_err()
                {
                    debug!("version requester went away");
                }
                MessageOutcome::Version(version)
            }
        }
    }
}
