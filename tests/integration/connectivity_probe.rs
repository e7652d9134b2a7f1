//! Health-endpoint probe feeding the connectivity monitor

use std::sync::Arc;
use std::time::Duration;
use tasksync::client::sync::{spawn_probe, ConnectivityMonitor, ConnectivityProbe, HttpProbe};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_probe_sees_live_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(format!("{}/api/health", server.uri()));
    assert!(probe.check().await);
}

#[tokio::test]
async fn test_probe_counts_any_response_as_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(format!("{}/api/health", server.uri()));
    assert!(probe.check().await);
}

#[tokio::test]
async fn test_probe_reports_offline_when_server_gone() {
    let server = MockServer::start().await;
    let url = format!("{}/api/health", server.uri());
    drop(server);

    let monitor = Arc::new(ConnectivityMonitor::new(true));
    let mut online = monitor.watch();
    let handle = spawn_probe(
        monitor.clone(),
        Arc::new(HttpProbe::new(url)),
        Duration::from_millis(20),
    );

    tokio::time::timeout(Duration::from_secs(10), online.changed())
        .await
        .expect("probe never reported")
        .unwrap();
    assert!(!monitor.is_online());
    handle.abort();
}
