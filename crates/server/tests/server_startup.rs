//! Tests that spawn the real `mediacopier` binary.

use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config with no content roots
fn minimal_config(port: u16, data_dir: &Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[catalog]
index_on_startup = false

[persistence]
data_dir = "{}"
"#,
        port,
        data_dir.display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_mediacopier"))
        .env("MEDIACOPIER_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_and_config_endpoints() {
    let port = get_available_port();
    let data_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, data_dir.path()));

    let mut server = spawn_server(config.path());
    assert!(
        wait_for_server(port, 60).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let health = tokio_test::assert_ok!(
        client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
    );
    assert!(health.status().is_success());

    let config_json: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(config_json["server"]["port"], port);
    assert_eq!(config_json["catalog"]["index_on_startup"], false);

    let jobs: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/jobs", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(jobs["total"], 0);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let mut server = spawn_server(&dir.path().join("does-not-exist.toml"));

    let status = timeout(Duration::from_secs(10), server.wait())
        .await
        .expect("Server should exit on missing config")
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let data_dir = TempDir::new().unwrap();
    let mut content = minimal_config(get_available_port(), data_dir.path());
    content.push_str("\n[planner]\nreserve_fraction = 1.5\n");
    let config = write_config(&content);

    let mut server = spawn_server(config.path());
    let status = timeout(Duration::from_secs(10), server.wait())
        .await
        .expect("Server should exit on invalid config")
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn test_demo_command_prints_plan() {
    let workdir = TempDir::new().unwrap();

    let output = timeout(
        Duration::from_secs(30),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_mediacopier"))
            .arg("demo")
            .arg(workdir.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Demo should finish")
    .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["order_id"], "demo-order");
    assert_eq!(report["planned_items"], 10);
    assert!(workdir.path().join("source").is_dir());
}
