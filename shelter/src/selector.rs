//! Request classification.
//!
//! [`RouteRules::select`] is a pure function of the request. Rules are
//! checked in a fixed order and the first match wins:
//!
//! 1. non-`GET` method: [`Strategy::Bypass`]
//! 2. non-network scheme (extension or data URLs): [`Strategy::Bypass`]
//! 3. no `Accept` header: [`Strategy::NetworkFirst`]
//! 4. `Accept` names an HTML document: [`Strategy::NetworkFirst`]
//! 5. `Accept` names an image: [`Strategy::CacheFirst`]
//! 6. static asset extension or asset origin: [`Strategy::CacheFirst`]
//! 7. configured revalidate pattern: [`Strategy::StaleWhileRevalidate`]
//! 8. anything else: [`Strategy::NetworkFirst`]
//!
//! The order matters because categories overlap: browsers list `image/*` in
//! the `Accept` header of page navigations, and a style sheet on a CDN is
//! both a static asset and a cross-origin request.

use std::fmt;

use http::Method;
use regex::Regex;
use shelter_core::FetchRequest;
use url::Url;

use crate::config::RouteConfig;
use crate::error::ConfigError;

const NETWORK_SCHEMES: [&str; 2] = ["http", "https"];

/// Caching strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Prefer the network, fall back to the cache.
    NetworkFirst,
    /// Prefer the cache, fetch only on a miss.
    CacheFirst,
    /// Serve the cache immediately and refresh it in the background.
    StaleWhileRevalidate,
    /// Do not intercept, the host handles the request itself.
    Bypass,
}

impl Strategy {
    /// Stable name used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network_first",
            Strategy::CacheFirst => "cache_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
            Strategy::Bypass => "bypass",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct RouteRules {
    static_extensions: Vec<String>,
    asset_origins: Vec<String>,
    revalidate: Vec<Regex>,
}

impl RouteRules {
    /// Compiles the configured rules.
    pub fn from_config(config: &RouteConfig) -> Result<Self, ConfigError> {
        let revalidate = config
            .revalidate
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            static_extensions: config
                .static_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            asset_origins: config
                .asset_origins
                .iter()
                .map(|host| host.to_ascii_lowercase())
                .collect(),
            revalidate,
        })
    }

    /// Chooses the strategy for a request.
    pub fn select(&self, request: &FetchRequest) -> Strategy {
        if request.method != Method::GET {
            return Strategy::Bypass;
        }
        if !NETWORK_SCHEMES.contains(&request.url.scheme()) {
            return Strategy::Bypass;
        }
        let Some(accept) = request.accept_header() else {
            return Strategy::NetworkFirst;
        };
        // Media types are case-insensitive.
        let accept = accept.to_ascii_lowercase();
        if accept.contains("text/html") {
            return Strategy::NetworkFirst;
        }
        if accept.contains("image/") {
            return Strategy::CacheFirst;
        }
        if self.is_static_asset(&request.url) {
            return Strategy::CacheFirst;
        }
        if self.is_revalidated(&request.url) {
            return Strategy::StaleWhileRevalidate;
        }
        Strategy::NetworkFirst
    }

    fn is_static_asset(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        if self
            .static_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
        {
            return true;
        }
        url.host_str().is_some_and(|host| {
            self.asset_origins
                .iter()
                .any(|origin| host.eq_ignore_ascii_case(origin))
        })
    }

    fn is_revalidated(&self, url: &Url) -> bool {
        self.revalidate
            .iter()
            .any(|pattern| pattern.is_match(url.path()))
    }
}

impl Default for RouteRules {
    fn default() -> Self {
        let config = RouteConfig::default();
        Self {
            static_extensions: config.static_extensions,
            asset_origins: config.asset_origins,
            revalidate: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROWSER_HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

    fn get(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
    }

    fn rules_with_revalidate(patterns: &[&str]) -> RouteRules {
        let config = RouteConfig {
            revalidate: patterns.iter().map(|p| p.to_string()).collect(),
            ..RouteConfig::default()
        };
        RouteRules::from_config(&config).unwrap()
    }

    #[test]
    fn test_non_get_is_bypassed() {
        let request = FetchRequest::new(Method::POST, Url::parse("https://app.example/api").unwrap())
            .accept("text/html");
        assert_eq!(RouteRules::default().select(&request), Strategy::Bypass);
    }

    #[test]
    fn test_non_network_scheme_is_bypassed() {
        let request = get("chrome-extension://abcdef/content.js").accept("*/*");
        assert_eq!(RouteRules::default().select(&request), Strategy::Bypass);
    }

    #[test]
    fn test_missing_accept_is_network_first() {
        // Even for a static asset extension.
        let request = get("https://app.example/app.css");
        assert_eq!(RouteRules::default().select(&request), Strategy::NetworkFirst);
    }

    #[test]
    fn test_html_wins_over_image_in_navigation_accept() {
        let mut request = get("https://app.example/page");
        request.headers.insert(
            http::header::ACCEPT,
            http::HeaderValue::from_static(BROWSER_HTML_ACCEPT),
        );
        assert_eq!(RouteRules::default().select(&request), Strategy::NetworkFirst);
    }

    #[test]
    fn test_accept_media_types_ignore_case() {
        let rules = RouteRules::default();
        let page = get("https://app.example/app.css").accept("TEXT/HTML");
        let avatar = get("https://app.example/avatar").accept("Image/PNG");

        assert_eq!(rules.select(&page), Strategy::NetworkFirst);
        assert_eq!(rules.select(&avatar), Strategy::CacheFirst);
    }

    #[test]
    fn test_image_accept_is_cache_first() {
        let request = get("https://app.example/avatar").accept("image/avif,image/webp,*/*");
        assert_eq!(RouteRules::default().select(&request), Strategy::CacheFirst);
    }

    #[test]
    fn test_static_extensions_are_cache_first() {
        let rules = RouteRules::default();
        for url in [
            "https://app.example/app.css",
            "https://app.example/js/main.JS",
            "https://app.example/fonts/inter.woff2?v=3",
        ] {
            assert_eq!(rules.select(&get(url).accept("*/*")), Strategy::CacheFirst, "{url}");
        }
    }

    #[test]
    fn test_external_stylesheet_is_cache_first() {
        let request = get("https://cdn.jsdelivr.net/npm/water.css@2/out/water.css").accept("text/css,*/*;q=0.1");
        assert_eq!(RouteRules::default().select(&request), Strategy::CacheFirst);
    }

    #[test]
    fn test_asset_origin_without_extension_is_cache_first() {
        let request = get("https://fonts.googleapis.com/css2?family=Inter").accept("text/css");
        assert_eq!(RouteRules::default().select(&request), Strategy::CacheFirst);
    }

    #[test]
    fn test_revalidate_pattern() {
        let rules = rules_with_revalidate(&["^/api/feed"]);
        let feed = get("https://app.example/api/feed?page=1").accept("application/json");
        let other = get("https://app.example/api/profile").accept("application/json");

        assert_eq!(rules.select(&feed), Strategy::StaleWhileRevalidate);
        assert_eq!(rules.select(&other), Strategy::NetworkFirst);
    }

    #[test]
    fn test_static_asset_rule_precedes_revalidate_pattern() {
        let rules = rules_with_revalidate(&[".*"]);
        let script = get("https://app.example/app.js").accept("*/*");
        assert_eq!(rules.select(&script), Strategy::CacheFirst);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let config = RouteConfig {
            revalidate: vec!["(unclosed".to_string()],
            ..RouteConfig::default()
        };
        let error = RouteRules::from_config(&config).unwrap_err();
        assert!(matches!(error, ConfigError::Pattern { ref pattern, .. } if pattern == "(unclosed"));
    }
}
