#![allow(dead_code)]

use std::path::Path;
use std::process::Output;

use serde_json::{Value, json};
use tokio::process::Command;
use wiremock::MockServer;

/// Run the CLI against a mock server with an isolated data directory.
pub async fn run_cli(args: &[&str], data_dir: &Path, server: &MockServer) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lectern"))
        .args(args)
        .env("LECTERN_BASE_URL", server.uri())
        .env("LECTERN_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .await
        .expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub async fn run_cli_success(args: &[&str], data_dir: &Path, server: &MockServer) -> String {
    let output = run_cli(args, data_dir, server).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure.
pub async fn run_cli_failure(args: &[&str], data_dir: &Path, server: &MockServer) -> String {
    let output = run_cli(args, data_dir, server).await;
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn envelope(data: Value) -> Value {
    json!({ "status": "success", "message": "ok", "data": data })
}

pub fn token_envelope(token: &str) -> Value {
    envelope(json!({ "token": token }))
}

pub fn profile_envelope(username: &str) -> Value {
    envelope(json!({
        "id": 7,
        "username": username,
        "email": format!("{}@example.edu", username),
        "roles": ["student"]
    }))
}

/// The access credential as written to the data directory.
pub fn stored_token(data_dir: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(data_dir.join("credential.json")).ok()?;
    let value: Value = serde_json::from_str(&raw).ok()?;
    value["access_token"].as_str().map(str::to_string)
}
