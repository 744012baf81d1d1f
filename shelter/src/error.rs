use shelter_backend::BackendError;
use shelter_core::{CacheKey, FetchError};
use thiserror::Error;
use url::Url;

/// Errors produced while serving or populating the cache.
///
/// None of these ever leave the [`Worker`](crate::Worker): each one is either
/// recovered into a response or logged.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Network unreachable or non-success status.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No stored entry in any current generation.
    #[error("no cached entry for {0}")]
    Miss(CacheKey),

    /// Storage refused the write (quota, I/O).
    #[error("cache write failed: {0}")]
    Write(#[from] BackendError),

    /// Some manifest URLs could not be pre-cached.
    #[error("pre-cache incomplete: {cached} stored, {} failed", .failed.len())]
    PartialPopulation {
        /// Number of manifest entries stored.
        cached: usize,
        /// Entries that could not be stored and why.
        failed: Vec<PopulationFailure>,
    },
}

/// A manifest URL that could not be pre-cached.
#[derive(Debug)]
pub struct PopulationFailure {
    /// The manifest entry, resolved against the scope.
    pub url: Url,
    /// Fetch or write failure.
    pub error: Box<CacheError>,
}

/// Invalid worker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// A configured URL could not be resolved against the scope.
    #[error("invalid URL {url:?}: {source}")]
    Url {
        /// The URL as written in the configuration.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// A revalidate pattern is not a valid regular expression.
    #[error("invalid revalidate pattern {pattern:?}: {source}")]
    Pattern {
        /// The pattern as written in the configuration.
        pattern: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },
}
