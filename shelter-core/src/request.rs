//! Intercepted request descriptor.

use http::{HeaderMap, HeaderValue, Method, header};
use url::Url;

use crate::CacheKey;

/// How the host issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation. Eligible for the offline fallback document.
    Navigate,
    /// Any other subresource or programmatic request.
    #[default]
    Other,
}

/// A request intercepted from the host page.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers as sent by the page.
    pub headers: HeaderMap,
    /// Navigation or subresource.
    pub mode: RequestMode,
}

impl FetchRequest {
    /// Creates a request with no headers.
    pub fn new(method: Method, url: Url) -> Self {
        FetchRequest {
            method,
            url,
            headers: HeaderMap::new(),
            mode: RequestMode::Other,
        }
    }

    /// Creates a `GET` request with no headers.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Marks this request as a page navigation.
    pub fn navigate(mut self) -> Self {
        self.mode = RequestMode::Navigate;
        self
    }

    /// Sets the `Accept` header.
    pub fn accept(mut self, value: &'static str) -> Self {
        self.headers
            .insert(header::ACCEPT, HeaderValue::from_static(value));
        self
    }

    /// Returns the `Accept` header, if present and valid UTF-8.
    pub fn accept_header(&self) -> Option<&str> {
        self.headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns `true` for page navigations.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Returns the cache key for this request.
    ///
    /// Only `GET` requests have one, nothing else is ever stored.
    pub fn cache_key(&self) -> Option<CacheKey> {
        (self.method == Method::GET).then(|| CacheKey::new(self.method.clone(), &self.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_only_for_get() {
        let url = Url::parse("https://app.example/submit").unwrap();
        assert!(FetchRequest::get(url.clone()).cache_key().is_some());
        assert!(FetchRequest::new(Method::POST, url).cache_key().is_none());
    }

    #[test]
    fn test_accept_header() {
        let url = Url::parse("https://app.example/").unwrap();
        let request = FetchRequest::get(url.clone()).accept("text/html");
        assert_eq!(request.accept_header(), Some("text/html"));
        assert_eq!(FetchRequest::get(url).accept_header(), None);
    }
}
