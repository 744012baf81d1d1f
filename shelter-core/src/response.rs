//! Response snapshot type and response provenance.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A complete response: status, headers and the buffered body.
///
/// The same type is produced by the network and stored in a generation.
/// Stored snapshots are never merged, a re-cache overwrites the old one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FetchResponse {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    body: Bytes,
}

impl FetchResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        FetchResponse {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Creates a `text/plain` response with the given status.
    pub fn text(status: StatusCode, body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Only an exact `200 OK` may be stored. Redirects and other 2xx are not.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Where a served response originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Fresh from the network.
    Network,
    /// Read from the named cache generation.
    Cache {
        /// Generation that held the entry.
        generation: SmolStr,
    },
    /// The offline fallback document served for a failed navigation.
    OfflineFallback,
    /// An error response built locally because nothing else was available.
    Synthesized,
}
