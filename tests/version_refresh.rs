//! Default version polling against a mock origin.

mod common;

use common::{client, proxy_config, MockOrigin, TestProxy};
use reqwest::StatusCode;
use std::time::{Duration, Instant};

use spa_proxy::lifecycle::{self, Shutdown, StartupError};
use spa_proxy::version::{OriginVersionSource, VersionSource};

async fn body_at(proxy: &TestProxy, path: &str) -> String {
    client()
        .get(proxy.url(path))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

async fn wait_for_body(proxy: &TestProxy, path: &str, expected: &str) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let body = body_at(proxy, path).await;
        if body == expected {
            return;
        }
        assert!(Instant::now() < deadline, "still serving {:?}", body);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test]
async fn test_origin_version_source_trims_body() {
    let origin = MockOrigin::start().await;
    origin.set_default_version("  v42\n");

    let source = OriginVersionSource::new(
        reqwest::Client::new(),
        &origin.url().parse().unwrap(),
        "default-version.txt",
    );
    assert_eq!(source.fetch_default().await.unwrap(), "v42");

    origin.set_default_version("   ");
    assert!(source.fetch_default().await.is_err());
}

#[tokio::test]
async fn test_missing_default_version_is_fatal() {
    let origin = MockOrigin::start().await;
    let dir = tempfile::tempdir().unwrap();

    let result = lifecycle::start(&proxy_config(&origin, dir.path()), &Shutdown::new()).await;
    assert!(matches!(result, Err(StartupError::InitialVersion(_))));
}

#[tokio::test]
async fn test_refresh_switches_default_and_survives_failures() {
    let origin = MockOrigin::start().await;
    origin.set_default_version("v1\n");
    origin.put("/v1/app.js", "application/javascript", "one");
    origin.put("/v2/app.js", "application/javascript", "two");

    let dir = tempfile::tempdir().unwrap();
    let mut config = proxy_config(&origin, dir.path());
    config.versions.refresh_interval_secs = 1;
    config.versions.retry_delay_secs = 1;
    let proxy = TestProxy::start(config).await;

    assert_eq!(body_at(&proxy, "/app.js").await, "one");

    origin.set_default_version("v2");
    wait_for_body(&proxy, "/app.js", "two").await;

    // A failing poll keeps the last known default.
    origin.put_with_status(
        "/default-version.txt",
        StatusCode::SERVICE_UNAVAILABLE,
        "text/plain",
        "down",
    );
    let polls = origin.hits("/default-version.txt");
    let deadline = Instant::now() + Duration::from_secs(10);
    while origin.hits("/default-version.txt") < polls + 2 {
        assert!(Instant::now() < deadline, "poller stopped polling");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(body_at(&proxy, "/app.js").await, "two");

    // And recovers once the origin does.
    origin.set_default_version("v1");
    wait_for_body(&proxy, "/app.js", "one").await;
}
