//! End-to-end calls through the reqwest transport against a local backend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use client_pipeline::api::ApiClient;
use client_pipeline::auth::{Anonymous, Credential, SessionStore};
use client_pipeline::config::{PipelineConfig, RetryConfig, TransportConfig};
use client_pipeline::http::{OutboundRequest, Pipeline, PipelineBuilder, ReqwestTransport};
use client_pipeline::lifecycle::CancellationSignal;
use client_pipeline::{PipelineError, RetryPolicy};

mod common;
use common::start_programmable_backend;

fn transport(request_timeout_secs: u64) -> ReqwestTransport {
    let config = TransportConfig {
        request_timeout_secs,
        ..Default::default()
    };
    ReqwestTransport::new(&config).unwrap()
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy::from_config(&RetryConfig {
        base_delay_ms: 5,
        max_delay_ms: 20,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_headers_reach_the_server() {
    let heads = Arc::new(Mutex::new(Vec::new()));
    let captured = heads.clone();
    let addr = start_programmable_backend(move |head| {
        captured.lock().unwrap().push(head.to_lowercase());
        async { (200, "ok".to_string()) }
    })
    .await;

    let session = Arc::new(SessionStore::new());
    session.sign_in(Credential::new("token-xyz"));
    let config = PipelineConfig::default();
    let pipeline = PipelineBuilder::from_config(&config, session)
        .unwrap()
        .metrics(false)
        .build(transport(5));

    let url = Url::parse(&format!("http://{}/api/items", addr)).unwrap();
    let response = pipeline.send(OutboundRequest::get(url)).await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.text().unwrap(), "ok");

    let heads = heads.lock().unwrap();
    assert_eq!(heads.len(), 1);
    let head = &heads[0];
    assert!(head.starts_with("get /api/items http/1.1"));
    assert!(head.contains("x-correlation-id: "));
    assert!(head.contains("authorization: bearer token-xyz"));
    assert!(head.contains(&format!("x-app-name: {}", config.client.app_name.to_lowercase())));
    assert!(head.contains("user-agent: "));
}

#[tokio::test]
async fn test_retries_503_until_success() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = start_programmable_backend(move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                (503, "busy".to_string())
            } else {
                (200, "done".to_string())
            }
        }
    })
    .await;

    let pipeline = Pipeline::builder(Arc::new(Anonymous))
        .retry_policy(fast_retries())
        .metrics(false)
        .build(transport(5));

    let url = Url::parse(&format!("http://{}/api/items", addr)).unwrap();
    let response = pipeline.send(OutboundRequest::get(url)).await.unwrap();

    assert_eq!(response.text().unwrap(), "done");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_connection_refused_is_network_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pipeline = Pipeline::builder(Arc::new(Anonymous))
        .retry_policy(RetryPolicy::disabled())
        .metrics(false)
        .build(transport(5));

    let url = Url::parse(&format!("http://{}/", addr)).unwrap();
    let err = pipeline.send(OutboundRequest::get(url)).await.unwrap_err();

    assert!(
        matches!(err, PipelineError::NetworkUnreachable(_)),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let addr = start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, "late".to_string())
    })
    .await;

    let pipeline = Pipeline::builder(Arc::new(Anonymous))
        .retry_policy(RetryPolicy::disabled())
        .metrics(false)
        .build(transport(1));

    let url = Url::parse(&format!("http://{}/", addr)).unwrap();
    let err = pipeline.send(OutboundRequest::get(url)).await.unwrap_err();

    assert!(matches!(err, PipelineError::Timeout), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_unauthorized_signs_session_out() {
    let addr = start_programmable_backend(|_| async { (401, String::new()) }).await;

    let session = Arc::new(SessionStore::new());
    session.sign_in(Credential::new("revoked"));
    let pipeline = Pipeline::builder(session.clone())
        .metrics(false)
        .build(transport(5));

    let url = Url::parse(&format!("http://{}/api/items", addr)).unwrap();
    let err = pipeline.send(OutboundRequest::get(url)).await.unwrap_err();

    assert!(matches!(err, PipelineError::AuthenticationRequired));
    assert!(session.current().is_none());
}

#[tokio::test]
async fn test_perform_diagnostics_returns_report() {
    let heads = Arc::new(Mutex::new(Vec::new()));
    let captured = heads.clone();
    let addr = start_programmable_backend(move |head| {
        captured.lock().unwrap().push(head);
        async { (200, "Client IP: 127.0.0.1".to_string()) }
    })
    .await;

    let pipeline = Pipeline::builder(Arc::new(Anonymous))
        .metrics(false)
        .build(transport(5));
    let api = ApiClient::new(pipeline, Url::parse(&format!("http://{}", addr)).unwrap());

    let report = api.perform_diagnostics(CancellationSignal::never()).await.unwrap();

    assert_eq!(report, "Client IP: 127.0.0.1");
    let heads = heads.lock().unwrap();
    assert!(heads[0].starts_with("POST /api/Diagnostics/PerformDiagnostics HTTP/1.1"));
}

#[tokio::test]
async fn test_nuget_stats_use_api_path() {
    let heads = Arc::new(Mutex::new(Vec::new()));
    let captured = heads.clone();
    let addr = start_programmable_backend(move |head| {
        captured.lock().unwrap().push(head);
        async { (200, r#"{"totalDownloads":1234567}"#.to_string()) }
    })
    .await;

    let pipeline = Pipeline::builder(Arc::new(Anonymous))
        .metrics(false)
        .build(transport(5));
    let api = ApiClient::new(pipeline, Url::parse(&format!("http://{}", addr)).unwrap());

    let stats = api
        .get_nuget_stats("Bit.BlazorUI", CancellationSignal::never())
        .await
        .unwrap();

    assert_eq!(stats.total_downloads, 1_234_567);
    let heads = heads.lock().unwrap();
    assert!(heads[0].starts_with("GET /api/Statistics/GetNugetStats/Bit.BlazorUI HTTP/1.1"));
}

#[tokio::test]
async fn test_github_stats_bypass_base_address() {
    let github_hits = Arc::new(AtomicU32::new(0));
    let counter = github_hits.clone();
    let github = start_programmable_backend(move |head| {
        counter.fetch_add(1, Ordering::SeqCst);
        let path_ok = head.starts_with("GET /repos/bitfoundation/bitplatform HTTP/1.1");
        async move {
            if path_ok {
                (200, r#"{"full_name":"bitfoundation/bitplatform","stargazers_count":1100,"forks_count":230}"#.to_string())
            } else {
                (500, String::new())
            }
        }
    })
    .await;
    let api_server = start_programmable_backend(|_| async { (500, String::new()) }).await;

    let pipeline = Pipeline::builder(Arc::new(Anonymous))
        .retry_policy(RetryPolicy::disabled())
        .metrics(false)
        .build(transport(5));
    let api = ApiClient::new(pipeline, Url::parse(&format!("http://{}/", api_server)).unwrap());

    let repo = Url::parse(&format!("http://{}/repos/bitfoundation/bitplatform", github)).unwrap();
    let stats = api
        .get_github_stats_at(repo, CancellationSignal::never())
        .await
        .unwrap();

    assert_eq!(stats.full_name, "bitfoundation/bitplatform");
    assert_eq!(stats.stargazers_count, 1100);
    assert_eq!(stats.forks_count, 230);
    assert_eq!(github_hits.load(Ordering::SeqCst), 1);
}
