//! End-to-end tests for the Consul catalog backend against a fake agent.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, RawQuery};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use url::Url;

use signpost::config::RouterConfig;
use signpost::directory::consul::ConsulCatalog;
use signpost::directory::{DirectoryError, ServiceDirectory};
use signpost::engine::{RedirectDecision, RedirectEngine};
use signpost::server;

const TOKEN: &str = "s3cret";

async fn catalog(
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> (StatusCode, String) {
    if headers.get("x-consul-token").and_then(|v| v.to_str().ok()) != Some(TOKEN) {
        return (StatusCode::FORBIDDEN, "ACL not found".into());
    }
    let query = query.unwrap_or_default();
    let body = match (name.as_str(), query.as_str()) {
        ("grafana", "") => {
            r#"[
                {"Node": "node2", "ServiceTags": ["http"], "ServicePort": 3000},
                {"Node": "node1", "ServiceTags": null, "ServicePort": 3000}
            ]"#
        }
        ("grafana", "tag=https&dc=dc1") => {
            r#"[{"Node": "node1", "ServiceTags": ["https"], "ServicePort": 3443}]"#
        }
        ("broken", _) => r#"{"not": "a list"}"#,
        ("zero", _) => r#"[{"Node": "node1", "ServiceTags": [], "ServicePort": 0}]"#,
        _ => "[]",
    };
    (StatusCode::OK, body.to_string())
}

async fn start_fake_agent() -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let router = Router::new().route("/v1/catalog/service/{name}", get(catalog));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });
    (addr, tx)
}

fn catalog_for(addr: SocketAddr, token: Option<&str>, dc: Option<&str>) -> ConsulCatalog {
    ConsulCatalog::new(
        server::build_http_client(),
        Url::parse(&format!("http://{addr}")).unwrap(),
        token.map(String::from),
        dc.map(String::from),
    )
}

#[tokio::test]
async fn lists_all_instances_without_port_type() {
    let (addr, shutdown) = start_fake_agent().await;
    let consul = catalog_for(addr, Some(TOKEN), None);

    let backends = consul.query("grafana", "").await.unwrap();
    assert_eq!(backends.len(), 2);
    assert_eq!(backends[0].hostname, "node2");
    assert_eq!(backends[0].tags, vec!["http".to_string()]);
    assert!(backends[1].tags.is_empty());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn port_type_and_datacenter_are_forwarded() {
    let (addr, shutdown) = start_fake_agent().await;
    let consul = catalog_for(addr, Some(TOKEN), Some("dc1"));

    let backends = consul.query("grafana", "https").await.unwrap();
    assert_eq!(backends.len(), 1);
    assert_eq!(backends[0].port, 3443);
    assert_eq!(backends[0].scheme(), "https");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unknown_service_is_empty() {
    let (addr, shutdown) = start_fake_agent().await;
    let consul = catalog_for(addr, Some(TOKEN), None);
    assert!(consul.query("loki", "").await.unwrap().is_empty());
    let _ = shutdown.send(());
}

#[tokio::test]
async fn rejected_token_is_a_status_error() {
    let (addr, shutdown) = start_fake_agent().await;
    let consul = catalog_for(addr, None, None);
    let err = consul.query("grafana", "").await.unwrap_err();
    assert!(matches!(err, DirectoryError::Status(StatusCode::FORBIDDEN)));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn malformed_catalog_is_a_decode_error() {
    let (addr, shutdown) = start_fake_agent().await;
    let consul = catalog_for(addr, Some(TOKEN), None);
    let err = consul.query("broken", "").await.unwrap_err();
    assert!(matches!(err, DirectoryError::Decode(_)));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn service_name_is_sent_as_one_segment() {
    let (addr, shutdown) = start_fake_agent().await;
    let consul = catalog_for(addr, Some(TOKEN), None);

    // only /v1/catalog/service/{name} is routed; a split name would 404
    let backends = consul.query("a/../../v1/kv", "").await.unwrap();
    assert!(backends.is_empty());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn portless_entry_is_rejected() {
    let (addr, shutdown) = start_fake_agent().await;
    let consul = catalog_for(addr, Some(TOKEN), None);
    let err = consul.query("zero", "").await.unwrap_err();
    assert!(matches!(err, DirectoryError::InvalidPort { node } if node == "node1"));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn engine_lists_consul_instances() {
    let (addr, shutdown) = start_fake_agent().await;
    let engine = RedirectEngine::new(
        Arc::new(RouterConfig::default()),
        Arc::new(catalog_for(addr, Some(TOKEN), None)),
    );

    let request = Url::parse("http://localhost/explore").unwrap();
    let RedirectDecision::CandidateList(listing) =
        engine.decide("grafana.service.consul", &request).await
    else {
        panic!("expected a listing");
    };
    let urls: Vec<&str> = listing.candidates.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["http://node1:3000/explore", "http://node2:3000/explore"]
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_agent_is_an_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let consul = catalog_for(addr, Some(TOKEN), None);
    let err = consul.query("grafana", "").await.unwrap_err();
    assert!(matches!(err, DirectoryError::Http { .. }));
}
