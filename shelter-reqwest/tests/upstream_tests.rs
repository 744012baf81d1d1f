//! Integration tests for ReqwestUpstream using wiremock.

use std::time::Duration;

use http::{Method, StatusCode};
use reqwest::Client;
use shelter::{NoopClients, ResponseSource, Worker, WorkerConfig};
use shelter_core::{FetchError, FetchRequest, Upstream};
use shelter_moka::MokaBackend;
use shelter_reqwest::ReqwestUpstream;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn upstream() -> ReqwestUpstream {
    ReqwestUpstream::from(Client::new())
}

/// Status, headers and body come back unchanged
#[tokio::test]
async fn test_response_integrity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("response body content")
                .insert_header("X-Custom-Header", "custom-value"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/data", mock_server.uri())).unwrap();
    let response = upstream().call(FetchRequest::get(url)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Custom-Header").unwrap(),
        "custom-value"
    );
    assert_eq!(response.body().as_ref(), b"response body content");
}

/// Request method and headers are forwarded
#[tokio::test]
async fn test_request_is_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/items/1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/items/1", mock_server.uri())).unwrap();
    let request = FetchRequest::new(Method::PUT, url).accept("application/json");
    let response = upstream().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// Error statuses are responses, not failures
#[tokio::test]
async fn test_error_status_is_a_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
    let response = upstream().call(FetchRequest::get(url)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.is_cacheable());
}

/// Unreachable hosts surface as network errors
#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let url = Url::parse("http://127.0.0.1:1/gone").unwrap();
    let result = upstream().call(FetchRequest::get(url)).await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}

/// Install over real HTTP, then fall back to the cache when the network stalls
#[tokio::test]
async fn test_worker_falls_back_when_network_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>shell</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
        .expect(1) // pre-cached, never fetched again
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inbox"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let scope = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let config = WorkerConfig::new(scope.clone(), "v1").precache(["/index.html", "/app.css"]);
    let worker = Worker::new(
        config,
        MokaBackend::builder().max_entries(100).build(),
        ReqwestUpstream::from(client),
        NoopClients,
    )
    .unwrap();

    assert!(worker.install().await.is_complete());
    worker.activate().await;

    let css = worker
        .fetch(FetchRequest::get(scope.join("/app.css").unwrap()).accept("text/css"))
        .await
        .served()
        .unwrap();
    assert_eq!(css.response.body().as_ref(), b"body{}");

    let page = worker
        .fetch(
            FetchRequest::get(scope.join("/inbox").unwrap())
                .navigate()
                .accept("text/html"),
        )
        .await
        .served()
        .unwrap();
    assert_eq!(page.source, ResponseSource::OfflineFallback);
    assert_eq!(page.response.body().as_ref(), b"<html>shell</html>");
}
