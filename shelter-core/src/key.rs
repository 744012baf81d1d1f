//! Cache key types.
//!
//! A [`CacheKey`] identifies one stored response inside a generation. It is
//! built from the request method and URL:
//!
//! - the URL fragment is dropped, it never reaches the network
//! - the query string is kept, `/a?x=1` and `/a?x=2` are distinct entries
//!
//! ```
//! use shelter_core::CacheKey;
//! use url::Url;
//!
//! let url = Url::parse("https://app.example/docs?page=2#intro").unwrap();
//! let key = CacheKey::new(http::Method::GET, &url);
//! assert_eq!(key.url(), "https://app.example/docs?page=2");
//! assert_eq!(format!("{}", key), "GET https://app.example/docs?page=2");
//! ```
//!
//! [`CacheKey`] uses `Arc` internally for cheap cloning, keys are handed to
//! background tasks on every write-through.

use http::Method;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
struct CacheKeyInner {
    method: SmolStr,
    url: SmolStr,
}

/// A cache key identifying a stored response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "CacheKeyInner", into = "CacheKeyInner")]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl CacheKey {
    /// Creates a key from a method and URL. The URL fragment is ignored.
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        CacheKey {
            inner: Arc::new(CacheKeyInner {
                method: SmolStr::new(method.as_str()),
                url: SmolStr::new(url.as_str()),
            }),
        }
    }

    /// Shorthand for a `GET` key, the only method stored responses are kept for.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Returns the request method component.
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Returns the normalized URL component.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Returns `true` for keys created from `GET` requests.
    pub fn is_get(&self) -> bool {
        self.inner.method == Method::GET.as_str()
    }
}

impl From<CacheKeyInner> for CacheKey {
    fn from(inner: CacheKeyInner) -> Self {
        CacheKey {
            inner: Arc::new(inner),
        }
    }
}

impl From<CacheKey> for CacheKeyInner {
    fn from(key: CacheKey) -> Self {
        Arc::try_unwrap(key.inner).unwrap_or_else(|shared| CacheKeyInner {
            method: shared.method.clone(),
            url: shared.url.clone(),
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.inner.method, self.inner.url)
    }
}
