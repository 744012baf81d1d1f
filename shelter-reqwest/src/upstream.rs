//! Upstream over reqwest-middleware's client.

use std::future::Future;
use std::pin::Pin;

use reqwest_middleware::ClientWithMiddleware;
use shelter_core::{FetchError, FetchRequest, FetchResponse, Upstream};
use tracing::debug;

/// Upstream that performs intercepted requests with a reqwest client.
///
/// The request keeps its method, URL and headers. The response body is
/// read to the end before the call resolves, since it may be stored.
#[derive(Clone)]
pub struct ReqwestUpstream {
    client: ClientWithMiddleware,
}

impl ReqwestUpstream {
    /// Create an upstream around a middleware client.
    pub fn new(client: ClientWithMiddleware) -> Self {
        Self { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }
}

impl From<reqwest::Client> for ReqwestUpstream {
    fn from(client: reqwest::Client) -> Self {
        Self::new(ClientWithMiddleware::from(client))
    }
}

impl Upstream for ReqwestUpstream {
    type Future = Pin<Box<dyn Future<Output = Result<FetchResponse, FetchError>> + Send>>;

    fn call(&self, req: FetchRequest) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let FetchRequest {
                method,
                url,
                headers,
                ..
            } = req;
            debug!(%method, %url, "upstream request");

            let response = client
                .request(method, url)
                .headers(headers)
                .send()
                .await
                .map_err(FetchError::network)?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(FetchError::network)?;

            Ok(FetchResponse::new(status, headers, body))
        })
    }
}
