//! Worker configuration.
//!
//! A [`WorkerConfig`] is usually read from YAML:
//!
//! ```
//! use shelter::WorkerConfig;
//!
//! let config = WorkerConfig::from_yaml(r#"
//! scope: https://app.example/
//! version: v3
//! precache:
//!   - /
//!   - /index.html
//!   - /app.css
//! routes:
//!   revalidate:
//!     - ^/api/feed
//! revalidate_warn_after: 10s
//! "#).unwrap();
//!
//! assert_eq!(config.generation_names().static_name, "v3-static");
//! assert_eq!(config.manifest().unwrap().len(), 3);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use url::Url;

use crate::error::ConfigError;
use crate::generation::GenerationNames;

/// Everything the worker needs to know about the host application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    /// Base URL that scope-relative manifest entries resolve against.
    pub scope: Url,
    /// Deployment version. Changing it invalidates every older generation.
    pub version: SmolStr,
    /// Assets to pre-cache at install time, absolute or scope-relative.
    #[serde(default)]
    pub precache: Vec<String>,
    /// Document served when a navigation fails with nothing cached.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,
    /// Request classification rules.
    #[serde(default)]
    pub routes: RouteConfig,
    /// Ask the host to activate right after install.
    #[serde(default = "default_skip_waiting")]
    pub skip_waiting_on_install: bool,
    /// Log background refreshes that run longer than this. They are never
    /// cancelled.
    #[serde(default, with = "humantime_serde")]
    pub revalidate_warn_after: Option<Duration>,
}

/// Request classification rules, see [`RouteRules`](crate::selector::RouteRules).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteConfig {
    /// Path extensions of static assets (style sheets, scripts, fonts).
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,
    /// Hosts serving static assets only (font providers, CDNs).
    #[serde(default = "default_asset_origins")]
    pub asset_origins: Vec<String>,
    /// Path regexes served stale-while-revalidate.
    #[serde(default)]
    pub revalidate: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            static_extensions: default_static_extensions(),
            asset_origins: default_asset_origins(),
            revalidate: Vec::new(),
        }
    }
}

fn default_offline_fallback() -> String {
    "/index.html".to_owned()
}

fn default_skip_waiting() -> bool {
    true
}

fn default_static_extensions() -> Vec<String> {
    [".css", ".js", ".mjs", ".woff", ".woff2", ".ttf"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_asset_origins() -> Vec<String> {
    [
        "fonts.googleapis.com",
        "fonts.gstatic.com",
        "cdn.jsdelivr.net",
        "cdnjs.cloudflare.com",
        "unpkg.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl WorkerConfig {
    /// Creates a configuration with default routes and no pre-cached assets.
    pub fn new(scope: Url, version: impl Into<SmolStr>) -> Self {
        Self {
            scope,
            version: version.into(),
            precache: Vec::new(),
            offline_fallback: default_offline_fallback(),
            routes: RouteConfig::default(),
            skip_waiting_on_install: default_skip_waiting(),
            revalidate_warn_after: None,
        }
    }

    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Sets the pre-cache manifest.
    pub fn precache<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache = entries.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the offline fallback document.
    pub fn offline_fallback(mut self, entry: impl Into<String>) -> Self {
        self.offline_fallback = entry.into();
        self
    }

    /// Sets the classification rules.
    pub fn routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    /// Names of the current static and dynamic generations.
    pub fn generation_names(&self) -> GenerationNames {
        GenerationNames::for_version(&self.version)
    }

    /// The pre-cache manifest resolved against the scope, in order.
    pub fn manifest(&self) -> Result<Vec<Url>, ConfigError> {
        self.precache.iter().map(|entry| self.resolve(entry)).collect()
    }

    /// The offline fallback document resolved against the scope.
    pub fn offline_fallback_url(&self) -> Result<Url, ConfigError> {
        self.resolve(&self.offline_fallback)
    }

    fn resolve(&self, entry: &str) -> Result<Url, ConfigError> {
        self.scope.join(entry).map_err(|source| ConfigError::Url {
            url: entry.to_owned(),
            source,
        })
    }
}
