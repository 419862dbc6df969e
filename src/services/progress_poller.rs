//! Progress poller
//!
//! Periodically fetches the progress snapshot of the active session and
//! feeds it to the workflow store. Fetch failures are logged and skipped;
//! the next tick tries again. The stop flag is checked after every fetch,
//! before the snapshot is applied, so nothing lands once a stop was
//! requested. The reducer additionally discards snapshots outside
//! `Processing`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Phase, PollingConfig, WorkflowEvent};
use crate::domain::ports::WorkflowApi;
use crate::services::workflow_store::WorkflowStore;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between fetches.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
        }
    }
}

impl From<&PollingConfig> for PollerConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Why the polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called.
    Requested,
    /// The workflow left `Processing`.
    Finished,
    /// There was no session id to poll.
    MissingSessionId,
}

/// Counters describing a poller's activity so far.
#[derive(Debug, Clone, Default)]
pub struct PollerStatus {
    /// A poll loop is currently active
    pub running: bool,
    /// Fetch attempts, successful or not
    pub total_polls: u64,
    /// Fetch attempts that returned an error
    pub failed_polls: u64,
    /// Snapshots dispatched into the store
    pub applied_snapshots: u64,
    /// When the last fetch attempt finished
    pub last_poll: Option<Instant>,
}

/// Outcome of a single fetch-and-apply attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    /// Fetch failed; state untouched.
    Skipped,
    /// Stop was requested or the batch was no longer processing.
    Discarded,
}

/// Fetches progress snapshots for the active session and feeds them to the store.
pub struct ProgressPoller {
    api: Arc<dyn WorkflowApi>,
    store: WorkflowStore,
    config: PollerConfig,
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
    status: Arc<RwLock<PollerStatus>>,
}

impl ProgressPoller {
    pub fn new(api: Arc<dyn WorkflowApi>, store: WorkflowStore, config: PollerConfig) -> Self {
        Self {
            api,
            store,
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            status: Arc::new(RwLock::new(PollerStatus::default())),
        }
    }

    /// Request the loop to stop. In-flight fetches finish but are not applied.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> PollerStatus {
        self.status.read().await.clone()
    }

    /// Fetch one snapshot and apply it. Used by the loop and for manual
    /// refresh; both share the same merge path.
    pub async fn refresh(&self) -> DomainResult<PollOutcome> {
        let session_id = self.store.session_id().ok_or(DomainError::MissingSessionId)?;
        if self.store.phase() != Phase::Processing {
            return Ok(PollOutcome::Discarded);
        }

        let fetched = self.api.fetch_progress(&session_id).await;
        {
            let mut status = self.status.write().await;
            status.total_polls += 1;
            status.last_poll = Some(Instant::now());
            if fetched.is_err() {
                status.failed_polls += 1;
            }
        }

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%session_id, error = %e, "progress fetch failed, retrying next tick");
                return Ok(PollOutcome::Skipped);
            }
        };

        if self.is_stop_requested() {
            debug!(%session_id, "stop requested, dropping fetched snapshot");
            return Ok(PollOutcome::Discarded);
        }

        let state = self.store.dispatch(WorkflowEvent::SnapshotReceived(snapshot));
        self.status.write().await.applied_snapshots += 1;
        debug!(
            %session_id,
            progress = state.overall_progress,
            phase = ?state.phase,
            "progress snapshot applied"
        );
        Ok(PollOutcome::Applied)
    }

    /// Poll until the batch leaves `Processing` or a stop is requested.
    ///
    /// The first fetch happens one interval after start.
    pub async fn run(&self) -> StopReason {
        if self.store.session_id().is_none() {
            error!("cannot poll progress without a session id");
            return StopReason::MissingSessionId;
        }

        self.status.write().await.running = true;
        info!(interval_ms = self.config.interval.as_millis(), "progress polling started");

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let reason = loop {
            if self.is_stop_requested() {
                break StopReason::Requested;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                () = self.wake.notified() => {}
            }
            if self.is_stop_requested() {
                break StopReason::Requested;
            }
            if self.store.phase() != Phase::Processing {
                break StopReason::Finished;
            }

            match self.refresh().await {
                Ok(_) => {}
                Err(DomainError::MissingSessionId) => break StopReason::MissingSessionId,
                Err(e) => warn!(error = %e, "progress refresh failed"),
            }

            if self.store.phase() != Phase::Processing {
                break StopReason::Finished;
            }
        };

        self.status.write().await.running = false;
        info!(?reason, "progress polling stopped");
        reason
    }

    /// Run the loop on a background task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<StopReason> {
        let poller = Arc::clone(self);
        tokio::spawn(async move { poller.run().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        FileHandle, FileProgress, ProcessResponse, ProgressSnapshot, WorkflowFile,
    };
    use crate::domain::ports::ApiError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted progress answers, repeating the last one.
    struct ScriptedApi {
        answers: Mutex<VecDeque<Result<ProgressSnapshot, ApiError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedApi {
        fn new(answers: Vec<Result<ProgressSnapshot, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl WorkflowApi for ScriptedApi {
        async fn process_invoices(&self, _: &[FileHandle]) -> Result<ProcessResponse, ApiError> {
            unreachable!("poller never submits")
        }

        async fn fetch_progress(&self, _: &str) -> Result<ProgressSnapshot, ApiError> {
            *self.calls.lock().unwrap() += 1;
            let mut answers = self.answers.lock().unwrap();
            if answers.len() > 1 {
                answers.pop_front().unwrap()
            } else {
                match answers.front() {
                    Some(Ok(snapshot)) => Ok(snapshot.clone()),
                    _ => Err(ApiError::Timeout),
                }
            }
        }

        async fn download_archive(&self, _: &str) -> Result<Vec<u8>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn entry(name: &str, status: &str, stage: &str, progress: f64) -> FileProgress {
        FileProgress {
            filename: name.to_string(),
            status: status.to_string(),
            stage: Some(stage.to_string()),
            progress: Some(progress),
            ..FileProgress::default()
        }
    }

    fn snapshot(status: &str, files: Vec<FileProgress>) -> ProgressSnapshot {
        ProgressSnapshot {
            session_id: Some("s-1".to_string()),
            status: status.to_string(),
            files,
            ..ProgressSnapshot::default()
        }
    }

    fn processing_store() -> WorkflowStore {
        let store = WorkflowStore::new();
        store.dispatch(WorkflowEvent::FilesAdded(vec![
            WorkflowFile::new(FileHandle::new("a.xml", 10)),
            WorkflowFile::new(FileHandle::new("b.xml", 10)),
        ]));
        store.dispatch(WorkflowEvent::ProcessingStarted);
        store.dispatch(WorkflowEvent::SubmissionAccepted {
            session_id: "s-1".to_string(),
        });
        store
    }

    fn fast() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_refresh_requires_session_id() {
        let api = ScriptedApi::new(vec![]);
        let poller = ProgressPoller::new(api.clone(), WorkflowStore::new(), fast());
        assert!(matches!(poller.refresh().await, Err(DomainError::MissingSessionId)));
        assert_eq!(poller.run().await, StopReason::MissingSessionId);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_untouched() {
        let store = processing_store();
        let before = store.snapshot();
        let api = ScriptedApi::new(vec![Err(ApiError::Network("reset".to_string()))]);
        let poller = ProgressPoller::new(api, store.clone(), fast());

        assert_eq!(poller.refresh().await.unwrap(), PollOutcome::Skipped);
        assert_eq!(store.snapshot(), before);
        assert_eq!(poller.status().await.failed_polls, 1);
    }

    #[tokio::test]
    async fn test_loop_runs_until_terminal_snapshot() {
        let store = processing_store();
        let api = ScriptedApi::new(vec![
            Ok(snapshot("PROCESSING", vec![entry("a.xml", "PROCESSING", "SAVE", 40.0)])),
            Err(ApiError::Timeout),
            Ok(snapshot(
                "COMPLETED",
                vec![
                    entry("a.xml", "COMPLETED", "COMPLETE", 100.0),
                    entry("b.xml", "COMPLETED", "COMPLETE", 100.0),
                ],
            )),
        ]);
        let poller = Arc::new(ProgressPoller::new(api.clone(), store.clone(), fast()));

        let reason = poller.spawn().await.unwrap();
        assert_eq!(reason, StopReason::Finished);

        let state = store.snapshot();
        assert_eq!(state.phase, Phase::Done);
        assert_eq!(state.overall_progress, 100);
        assert!(state.results.unwrap().success);
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_stop_prevents_further_application() {
        let store = processing_store();
        let api = ScriptedApi::new(vec![Ok(snapshot(
            "PROCESSING",
            vec![entry("a.xml", "PROCESSING", "SIGN", 20.0)],
        ))]);
        let poller = ProgressPoller::new(api, store.clone(), fast());
        poller.stop();

        assert_eq!(poller.refresh().await.unwrap(), PollOutcome::Discarded);
        assert_eq!(poller.run().await, StopReason::Requested);
        assert!(store.snapshot().files.iter().all(|f| f.progress == 10));
    }

    #[tokio::test]
    async fn test_spawned_loop_stops_on_request() {
        let store = processing_store();
        let api = ScriptedApi::new(vec![Ok(snapshot("PROCESSING", vec![]))]);
        let poller = Arc::new(ProgressPoller::new(api, store, fast()));

        let handle = poller.spawn();
        tokio::time::sleep(Duration::from_millis(35)).await;
        poller.stop();

        assert_eq!(handle.await.unwrap(), StopReason::Requested);
        assert!(!poller.status().await.running);
    }

    #[tokio::test]
    async fn test_reset_ends_loop_and_discards_snapshots() {
        let store = processing_store();
        let api = ScriptedApi::new(vec![Ok(snapshot(
            "PROCESSING",
            vec![entry("a.xml", "PROCESSING", "VALIDATE", 60.0)],
        ))]);
        let poller = Arc::new(ProgressPoller::new(api, store.clone(), fast()));
        store.dispatch(WorkflowEvent::Reset);

        assert!(matches!(poller.refresh().await, Err(DomainError::MissingSessionId)));
        assert_eq!(poller.spawn().await.unwrap(), StopReason::MissingSessionId);
        assert!(store.snapshot().files.is_empty());
    }
}
