//! End-to-end batch scenarios: orchestrator, store and poller wired to a
//! mock backend through the real HTTP client.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use iconesign::domain::models::{FileStatus, IntakeConfig, Phase, WorkflowState};
use iconesign::infrastructure::http::IconeSignClient;
use iconesign::services::{
    IntakePolicy, PollerConfig, ProgressPoller, StopReason, WorkflowOrchestrator, WorkflowStore,
};
use mockito::{Matcher, Server};
use serde_json::json;

const FAST: PollerConfig = PollerConfig {
    interval: Duration::from_millis(20),
};

fn orchestrator(client: Arc<IconeSignClient>) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(
        client,
        WorkflowStore::new(),
        IntakePolicy::upload(&IntakeConfig::default()),
    )
}

async fn accept_batch(server: &mut Server) -> mockito::Mock {
    server
        .mock("POST", "/api/v1/workflow/process-invoices")
        .with_status(200)
        .with_body(json!({"sessionId": "s-42"}).to_string())
        .expect(1)
        .create_async()
        .await
}

async fn run_poller(
    client: Arc<IconeSignClient>,
    store: &WorkflowStore,
) -> StopReason {
    let poller = Arc::new(ProgressPoller::new(client, store.clone(), FAST));
    tokio::time::timeout(Duration::from_secs(5), poller.spawn())
        .await
        .expect("poller did not finish")
        .expect("poller task panicked")
}

#[tokio::test]
async fn test_three_file_batch_runs_to_completion() {
    common::setup_test_logging();
    let mut server = Server::new_async().await;
    let dir = common::temp_dir();
    let base = format!("{}/api/v1", server.url());

    let submit = accept_batch(&mut server).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let progress = server
        .mock("GET", "/api/v1/progress/s-42")
        .with_status(200)
        .with_body_from_request(move |_| {
            let body = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => common::snapshot_body(
                    "PROCESSING",
                    &[
                        ("a.xml", "PROCESSING", "validate", 60),
                        ("b.xml", "PROCESSING", "sign", 30),
                        ("c.xml", "PENDING", "upload", 0),
                    ],
                ),
                _ => common::snapshot_body(
                    "COMPLETED",
                    &[
                        ("a.xml", "COMPLETED", "complete", 100),
                        ("b.xml", "COMPLETED", "complete", 100),
                        ("c.xml", "FAILED", "sign", 20),
                    ],
                ),
            };
            body.into_bytes()
        })
        .expect_at_least(2)
        .create_async()
        .await;

    let client = common::client(&base, Some("tok"));
    let orch = orchestrator(client.clone());
    let outcome = orch.add_files(vec![
        common::write_invoice(dir.path(), "a.xml"),
        common::write_invoice(dir.path(), "b.xml"),
        common::write_invoice(dir.path(), "c.xml"),
    ]);
    assert_eq!(outcome.accepted.len(), 3);

    let started = orch.start().await.unwrap();
    assert_eq!(started.phase, Phase::Processing);
    assert_eq!(started.session_id.as_deref(), Some("s-42"));

    let mut rx = orch.store().subscribe();
    let reason = run_poller(client, orch.store()).await;
    assert_eq!(reason, StopReason::Finished);

    let state = rx.borrow_and_update().clone();
    assert_eq!(state.phase, Phase::Done);
    assert_eq!(state.overall_progress, 100);

    let results = state.results.expect("terminal state carries results");
    assert!(results.success);
    assert_eq!(results.total_files, 3);
    assert_eq!(results.successful_files, 2);
    assert_eq!(results.failed_files, 1);
    assert_eq!(results.success_rate(), 67);
    assert_eq!(results.zip_download_url.as_deref(), Some("/download/s-42.zip"));

    assert!(calls.load(Ordering::SeqCst) >= 2);
    submit.assert_async().await;
    progress.assert_async().await;
}

#[tokio::test]
async fn test_failed_batch_status_is_unsuccessful() {
    let mut server = Server::new_async().await;
    let dir = common::temp_dir();
    let base = format!("{}/api/v1", server.url());

    accept_batch(&mut server).await;
    server
        .mock("GET", "/api/v1/progress/s-42")
        .with_status(200)
        .with_body(common::snapshot_body(
            "FAILED",
            &[("a.xml", "FAILED", "save", 40)],
        ))
        .create_async()
        .await;

    let client = common::client(&base, Some("tok"));
    let orch = orchestrator(client.clone());
    orch.add_files(vec![common::write_invoice(dir.path(), "a.xml")]);
    orch.start().await.unwrap();

    assert_eq!(run_poller(client, orch.store()).await, StopReason::Finished);
    let state = orch.store().snapshot();
    let results = state.results.unwrap();
    assert!(!results.success);
    assert_eq!(results.failed_files, 1);
    assert_eq!(state.files[0].status, FileStatus::Error);
}

#[tokio::test]
async fn test_submission_failure_fails_all_files_without_polling() {
    let mut server = Server::new_async().await;
    let dir = common::temp_dir();
    let base = format!("{}/api/v1", server.url());

    server
        .mock("POST", "/api/v1/workflow/process-invoices")
        .with_status(500)
        .with_body(json!({"message": "signing service down"}).to_string())
        .create_async()
        .await;
    let progress = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = common::client(&base, Some("tok"));
    let orch = orchestrator(client);
    orch.add_files(vec![
        common::write_invoice(dir.path(), "a.xml"),
        common::write_invoice(dir.path(), "b.xml"),
    ]);

    let state = orch.start().await.unwrap();
    assert_eq!(state.phase, Phase::Done);
    assert!(state.session_id.is_none());
    assert!(state.files.iter().all(|f| f.status == FileStatus::Error));
    assert!(state.files[0]
        .error
        .as_deref()
        .unwrap()
        .contains("signing service down"));

    let results = state.results.unwrap();
    assert!(!results.success);
    assert_eq!(results.failed_files, 2);
    progress.assert_async().await;
}

#[tokio::test]
async fn test_poll_failures_are_skipped_until_stopped() {
    let mut server = Server::new_async().await;
    let dir = common::temp_dir();
    let base = format!("{}/api/v1", server.url());

    accept_batch(&mut server).await;
    server
        .mock("GET", "/api/v1/progress/s-42")
        .with_status(503)
        .create_async()
        .await;

    let client = common::client(&base, Some("tok"));
    let orch = orchestrator(client.clone());
    orch.add_files(vec![common::write_invoice(dir.path(), "a.xml")]);
    let before = orch.start().await.unwrap();

    let poller = Arc::new(ProgressPoller::new(client, orch.store().clone(), FAST));
    let handle = poller.spawn();
    tokio::time::sleep(Duration::from_millis(150)).await;
    poller.stop();
    let reason = handle.await.unwrap();

    assert_eq!(reason, StopReason::Requested);
    let status = poller.status().await;
    assert!(status.failed_polls >= 1);
    assert_eq!(status.applied_snapshots, 0);
    assert!(!status.running);

    let after = orch.store().snapshot();
    assert_eq!(after.phase, Phase::Processing);
    assert_eq!(after.files, before.files);
}

#[tokio::test]
async fn test_reset_after_completion_allows_new_batch() {
    let mut server = Server::new_async().await;
    let dir = common::temp_dir();
    let base = format!("{}/api/v1", server.url());

    server
        .mock("POST", "/api/v1/workflow/process-invoices")
        .with_status(200)
        .with_body(json!({"sessionId": "s-42"}).to_string())
        .expect(2)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/progress/s-42")
        .with_status(200)
        .with_body(common::snapshot_body(
            "COMPLETED",
            &[("a.xml", "COMPLETED", "complete", 100)],
        ))
        .create_async()
        .await;

    let client = common::client(&base, Some("tok"));
    let orch = orchestrator(client.clone());
    orch.add_files(vec![common::write_invoice(dir.path(), "a.xml")]);
    orch.start().await.unwrap();
    run_poller(client, orch.store()).await;
    assert_eq!(orch.store().phase(), Phase::Done);

    assert_eq!(orch.reset(), WorkflowState::default());
    orch.add_files(vec![common::write_invoice(dir.path(), "a.xml")]);
    let restarted = orch.start().await.unwrap();
    assert_eq!(restarted.phase, Phase::Processing);
}
