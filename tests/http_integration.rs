//! HTTP front-end integration tests: real listener, real client.

#![cfg(unix)]

mod common;

use std::time::Duration;

use common::{write_file, write_script};
use tempfile::TempDir;
use tokio::sync::mpsc;

use cascade_server::config::ServerConfig;
use cascade_server::http::HttpServer;
use cascade_server::lifecycle::Shutdown;

async fn start_server(root: &std::path::Path) -> (std::net::SocketAddr, Shutdown) {
    let mut config = ServerConfig::default();
    config.pipeline.web_root = root.to_path_buf();
    config.observability.metrics_enabled = false;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    (addr, shutdown)
}

#[tokio::test]
async fn serves_static_and_dynamic_content_over_http() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "hello.txt", "hello over http", 0o644);
    write_script(
        root.path(),
        "api/status",
        "printf 'status 201\\n' >&2\nprintf 'created'",
    );

    let (addr, shutdown) = start_server(root.path()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/hello.txt"))
        .send()
        .await
        .expect("Server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    assert_eq!(res.text().await.unwrap(), "hello over http");

    let res = client
        .get(format!("http://{addr}/api/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(res.text().await.unwrap(), "created");

    let res = client
        .get(format!("http://{addr}/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn request_bodies_reach_stage_processes() {
    let root = TempDir::new().unwrap();
    write_script(root.path(), "echo", "cat");

    let (addr, shutdown) = start_server(root.path()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .post(format!("http://{addr}/echo"))
        .body("ping across the wire")
        .send()
        .await
        .expect("Server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ping across the wire");

    shutdown.trigger();
}

#[tokio::test]
async fn gatekeeper_rejections_surface_as_http_statuses() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "page.txt", "content", 0o644);
    write_script(
        root.path(),
        ".gatekeeper#1",
        "printf 'status 403\\n' >&2\nprintf 'denied'",
    );

    let (addr, shutdown) = start_server(root.path()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/page.txt"))
        .send()
        .await
        .expect("Server unreachable");
    assert_eq!(res.status(), 403);
    assert_eq!(res.text().await.unwrap(), "denied");

    shutdown.trigger();
}
