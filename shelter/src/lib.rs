#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Host-side page control: the [`Clients`](clients::Clients) trait.
pub mod clients;

/// Worker configuration read from YAML.
pub mod config;

/// Error types.
///
/// Defines [`CacheError`] which covers:
/// - Network failures
/// - Cache misses
/// - Storage write failures
/// - Partial pre-cache population
pub mod error;

/// Cache generation lifecycle: population, lookup, write-through, reclaim.
pub mod generation;

/// Control messages posted by the hosting page.
pub mod message;

/// Metrics collection, enabled by the `metrics` feature.
pub mod metrics;

/// Background task offloading for write-through and revalidation.
pub mod offload;

/// Request classification.
pub mod selector;

/// Network-first, cache-first and stale-while-revalidate executors.
pub mod strategy;

/// The event dispatcher.
pub mod worker;

pub use clients::{Clients, NoopClients};
pub use config::{RouteConfig, WorkerConfig};
pub use error::{CacheError, ConfigError, PopulationFailure};
pub use generation::{CacheHit, GenerationManager, GenerationNames};
pub use message::{ControlMessage, MessageEvent, MessageOutcome};
pub use selector::{RouteRules, Strategy};
pub use strategy::{FetchOutcome, Served, StrategyExecutor};
pub use worker::{Event, EventKind, EventOutcome, InstallReport, Worker};

pub use shelter_core::{
    CacheKey, FetchError, FetchRequest, FetchResponse, Offload, RequestMode, ResponseSource,
    Upstream,
};

/// The `shelter` prelude.
///
/// ```rust
/// use shelter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Clients, FetchOutcome, FetchRequest, FetchResponse, Upstream, Worker, WorkerConfig,
    };
}
