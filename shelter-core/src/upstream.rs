use std::future::Future;

use http::StatusCode;
use thiserror::Error;

use crate::{FetchRequest, FetchResponse};

/// Failure to obtain a usable response from the network.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The network could not be reached or the transfer broke off.
    #[error("network request failed: {0}")]
    Network(Box<dyn std::error::Error + Send + Sync>),

    /// The network answered, but not with a success status.
    #[error("unexpected response status {0}")]
    Status(StatusCode),
}

impl FetchError {
    /// Wraps any error as a network failure.
    pub fn network<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FetchError::Network(Box::new(error))
    }
}

/// Trait for reaching the network with intercepted requests.
///
/// Any HTTP status is a successful call; only transport failures are
/// reported as [`FetchError`]. Implementations are cloned into background
/// refresh tasks, so they should be cheap to clone.
///
/// # Examples
///
/// ```rust,ignore
/// use shelter_core::{FetchError, FetchRequest, FetchResponse, Upstream};
/// use std::future::Ready;
///
/// #[derive(Clone)]
/// struct Offline;
///
/// impl Upstream for Offline {
///     type Future = Ready<Result<FetchResponse, FetchError>>;
///
///     fn call(&self, _req: FetchRequest) -> Self::Future {
///         std::future::ready(Err(FetchError::network(std::io::Error::other("offline"))))
///     }
/// }
/// ```
pub trait Upstream: Clone + Send + Sync + 'static {
    /// The future that resolves to the network response.
    type Future: Future<Output = Result<FetchResponse, FetchError>> + Send + 'static;

    /// Send the request to the network.
    fn call(&self, req: FetchRequest) -> Self::Future;
}
