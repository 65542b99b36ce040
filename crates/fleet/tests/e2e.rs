// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that run the `fleet` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const BIN: &str = env!("CARGO_BIN_EXE_fleet");

fn write_config(dir: &Path, port: u16, extra: &str) -> PathBuf {
    let path = dir.join("fleet.toml");
    let db = dir.join("fleet.db");
    let content = format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}

[auth]
api_token = "api"
driver_token = "drv"

[storage]
database_path = "{}"
{extra}
"#,
        db.display()
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), 9100, "");
    let output = Command::new(BIN)
        .args(["check-config", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("127.0.0.1:9100"), "got: {stdout}");
}

#[test]
fn check_config_reports_typo_with_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), 9100, "[hub]\nmailbox_capacty = 8\n");
    let output = Command::new(BIN)
        .args(["check-config", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mailbox_capacity"), "got: {stderr}");
}

struct ChildGuard(std::process::Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

#[tokio::test]
async fn serve_relays_driver_location_to_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let port = free_port();
    let config = write_config(dir.path(), port, "");
    let _child = ChildGuard(
        Command::new(BIN)
            .args(["serve", "--config"])
            .arg(&config)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap(),
    );

    let web_url = format!("ws://127.0.0.1:{port}/ws/web?token=api");
    let mut dashboard = None;
    for _ in 0..100 {
        if let Ok((socket, _)) = connect_async(web_url.as_str()).await {
            dashboard = Some(socket);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let mut dashboard = dashboard.expect("server never came up");

    let mut driver = connect_async(format!(
        "ws://127.0.0.1:{port}/ws/mobile?vehicle_id=AMB-1&token=drv"
    ))
    .await
    .unwrap()
    .0;
    driver
        .send(Message::text(
            json!({"type": "location_update", "payload": {"lat": 1.0, "lng": 2.0}}).to_string(),
        ))
        .await
        .unwrap();

    let mut seen = Vec::new();
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), dashboard.next())
            .await
            .expect("timed out")
            .expect("closed")
            .unwrap();
        let Message::Text(text) = msg else { continue };
        let value: Value = serde_json::from_str(text.as_str()).unwrap();
        seen.push(value["type"].as_str().unwrap_or_default().to_string());
        if value["type"] == "location_update" {
            assert_eq!(value["payload"]["vehicle_id"], "AMB-1");
            assert_eq!(value["payload"]["lat"], 1.0);
            assert_eq!(value["payload"]["lng"], 2.0);
            break;
        }
    }
    assert_eq!(seen[0], "initial_locations");
    assert!(seen.contains(&"vehicle_online".to_string()));
}
