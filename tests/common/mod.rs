//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use iconesign::domain::models::FileHandle;
use iconesign::infrastructure::http::{IconeSignClient, IconeSignClientConfig, RetryPolicy};
use tempfile::TempDir;

pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write a small invoice and return its handle.
pub fn write_invoice(dir: &Path, name: &str) -> FileHandle {
    let body = format!("<Invoice><Ref>{name}</Ref></Invoice>");
    let path = dir.join(name);
    std::fs::write(&path, &body).expect("Failed to write invoice");
    FileHandle::new(path, body.len() as u64)
}

/// Client against a mock server, retries disabled.
pub fn client(base_url: &str, token: Option<&str>) -> Arc<IconeSignClient> {
    client_with_retry(base_url, token, RetryPolicy::none())
}

pub fn client_with_retry(
    base_url: &str,
    token: Option<&str>,
    retry_policy: RetryPolicy,
) -> Arc<IconeSignClient> {
    let client = IconeSignClient::new(IconeSignClientConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        retry_policy,
    })
    .expect("Failed to create client");
    Arc::new(client.with_token(token.map(str::to_string)))
}

/// Snapshot body in the backend's wire format.
pub fn snapshot_body(status: &str, files: &[(&str, &str, &str, u8)]) -> String {
    let files: Vec<_> = files
        .iter()
        .map(|(name, status, stage, progress)| {
            serde_json::json!({
                "filename": name,
                "status": status,
                "stage": stage,
                "progress": progress,
            })
        })
        .collect();
    let zip = (status == "COMPLETED").then_some("/download/s-42.zip");
    serde_json::json!({
        "sessionId": "s-42",
        "status": status,
        "files": files,
        "zipDownloadUrl": zip,
    })
    .to_string()
}

pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
