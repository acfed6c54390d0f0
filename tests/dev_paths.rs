//! Dev-path passthrough through a running proxy.

mod common;

use clap::Parser;
use common::{client, files_under, proxy_config, MockOrigin, TestProxy};
use reqwest::StatusCode;
use std::io::Write;

use spa_proxy::config::{load_config, Args, ConfigError, DevPathConfig};

#[tokio::test]
async fn test_dev_prefix_bypasses_cache() {
    let origin = MockOrigin::start().await;
    origin.put("/v1/index.html", "text/html", "<html>v1</html>");
    let dev = MockOrigin::start().await;
    dev.put("/api/users", "application/json", "[\"ada\"]");

    let dir = tempfile::tempdir().unwrap();
    let mut config = proxy_config(&origin, dir.path());
    config.versions.default_version = Some("v1".to_string());
    config.dev_proxy.routes = vec![DevPathConfig {
        prefix: "/api".to_string(),
        target: format!("http://{}", dev.addr),
    }];
    let proxy = TestProxy::start(config).await;
    let client = client();

    for _ in 0..2 {
        let response = client
            .get(proxy.url("/api/users?version=v9"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-cache").is_none());
        assert!(response.headers().get("set-cookie").is_none());
        assert_eq!(response.text().await.unwrap(), "[\"ada\"]");
    }
    assert_eq!(dev.hits("/api/users"), 2);
    assert!(files_under(dir.path()).is_empty());

    let app = client.get(proxy.url("/apps")).send().await.unwrap();
    assert_eq!(app.headers()["x-cache"], "miss");
    assert_eq!(app.text().await.unwrap(), "<html>v1</html>");
    assert_eq!(dev.hits("/v1/index.html"), 0);
}

#[tokio::test]
async fn test_bad_dev_target_is_bad_gateway() {
    let origin = MockOrigin::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"[{{"prefix": "/api", "target": "::not a url"}}]"#).unwrap();

    let args = Args::try_parse_from([
        "spa-proxy",
        "--source",
        &origin.url(),
        "--cache-dir",
        dir.path().to_str().unwrap(),
        "--default-version",
        "v1",
        "--bind",
        "127.0.0.1:0",
        "--dev-paths",
        file.path().to_str().unwrap(),
    ])
    .unwrap();
    let config = load_config(args).unwrap();
    assert_eq!(config.dev_proxy.routes.len(), 1);

    let proxy = TestProxy::start(config).await;
    let response = client().get(proxy.url("/api/x")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_empty_prefix_forwards_everything() {
    let origin = MockOrigin::start().await;
    origin.put("/v1/index.html", "text/html", "<html>v1</html>");
    let dev = MockOrigin::start().await;
    dev.put("/dashboard", "text/html", "<html>dev</html>");

    let dir = tempfile::tempdir().unwrap();
    let mut config = proxy_config(&origin, dir.path());
    config.versions.default_version = Some("v1".to_string());
    config.dev_proxy.routes = vec![DevPathConfig {
        prefix: String::new(),
        target: format!("http://{}", dev.addr),
    }];
    let proxy = TestProxy::start(config).await;

    let response = client().get(proxy.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.text().await.unwrap(), "<html>dev</html>");
    assert_eq!(origin.hits("/v1/index.html"), 0);
    assert!(files_under(dir.path()).is_empty());
}

#[test]
fn test_https_dev_target_is_rejected_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"[{{"prefix": "/api", "target": "https://localhost:4000"}}]"#).unwrap();

    let args = Args::try_parse_from([
        "spa-proxy",
        "--source",
        "http://origin.example.com/",
        "--cache-dir",
        dir.path().to_str().unwrap(),
        "--dev-paths",
        file.path().to_str().unwrap(),
    ])
    .unwrap();

    match load_config(args) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "dev_proxy.routes");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}
