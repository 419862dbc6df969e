//! Drives a batch from file selection to submission.
//!
//! The orchestrator owns the only submit path. Once the backend accepts the
//! batch, per-file state is updated exclusively by the progress poller.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    FileHandle, Phase, ProgressSnapshot, WorkflowEvent, WorkflowFile, WorkflowState,
};
use crate::domain::ports::WorkflowApi;
use crate::services::file_intake::{IntakeOutcome, IntakePolicy};
use crate::services::workflow_store::WorkflowStore;

/// Drives a batch: intake, submission, polling and reset, all through the store.
pub struct WorkflowOrchestrator {
    api: Arc<dyn WorkflowApi>,
    store: WorkflowStore,
    policy: IntakePolicy,
}

impl WorkflowOrchestrator {
    pub fn new(api: Arc<dyn WorkflowApi>, store: WorkflowStore, policy: IntakePolicy) -> Self {
        Self { api, store, policy }
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    /// Run intake on the candidates and append the accepted ones.
    ///
    /// Rejections are returned for display; they never reach the batch.
    pub fn add_files(&self, candidates: Vec<FileHandle>) -> IntakeOutcome {
        let mut outcome = self.policy.partition(candidates);
        if !outcome.accepted.is_empty() {
            let before = self.store.snapshot().files.len();
            let state = self
                .store
                .dispatch(WorkflowEvent::FilesAdded(outcome.accepted.clone()));
            if state.files.len() == before {
                // Batch is running; nothing was added.
                outcome.accepted.clear();
            }
        }
        outcome
    }

    pub fn remove_file(&self, id: Uuid) -> WorkflowState {
        self.store.dispatch(WorkflowEvent::FileRemoved(id))
    }

    pub fn clear_files(&self) -> WorkflowState {
        self.store.dispatch(WorkflowEvent::FilesCleared)
    }

    /// Submit the batch.
    ///
    /// Returns an error only when there is nothing to start. A rejected or
    /// failed submission is a normal outcome: every file is marked as failed
    /// and the state moves to `Done` with unsuccessful results.
    #[instrument(skip(self))]
    pub async fn start(&self) -> DomainResult<WorkflowState> {
        // The phase check and the switch to `Processing` happen in one store
        // update; only the caller that made the switch submits.
        let (before, started) = self.store.transition(WorkflowEvent::ProcessingStarted);
        match before {
            Phase::Processing => return Err(DomainError::BatchInProgress),
            Phase::Done => {
                warn!("previous batch finished; reset before starting a new one");
                return Err(DomainError::BatchInProgress);
            }
            Phase::Idle => {}
        }
        if started.phase != Phase::Processing {
            return Err(DomainError::NoFiles);
        }

        let handles: Vec<FileHandle> = started.files.iter().map(|f| f.file.clone()).collect();

        let event = match self.api.process_invoices(&handles).await {
            Ok(response) => match response.session_id.filter(|id| !id.is_empty()) {
                Some(session_id) => {
                    info!(%session_id, files = handles.len(), "batch accepted");
                    WorkflowEvent::SubmissionAccepted { session_id }
                }
                None => {
                    warn!("backend accepted the batch without a session id");
                    WorkflowEvent::SubmissionFailed {
                        message: response
                            .message
                            .unwrap_or_else(|| "No session identifier received".to_string()),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "batch submission failed");
                WorkflowEvent::SubmissionFailed {
                    message: e.to_string(),
                }
            }
        };

        Ok(self.store.dispatch(event))
    }

    /// Follow a batch submitted earlier, by another run or another client.
    ///
    /// The file list is rebuilt from the snapshot's entries, then the
    /// snapshot itself is applied. A terminal snapshot lands straight in
    /// `Done`.
    pub fn attach(&self, session_id: &str, snapshot: ProgressSnapshot) -> DomainResult<WorkflowState> {
        if self.store.phase() != Phase::Idle {
            return Err(DomainError::BatchInProgress);
        }
        if session_id.is_empty() {
            return Err(DomainError::MissingSessionId);
        }
        if snapshot.files.is_empty() {
            return Err(DomainError::NoFiles);
        }

        let files = snapshot
            .files
            .iter()
            .map(|entry| WorkflowFile::new(FileHandle::new(&entry.filename, 0)))
            .collect();
        self.store.dispatch(WorkflowEvent::FilesAdded(files));
        self.store.dispatch(WorkflowEvent::ProcessingStarted);
        self.store.dispatch(WorkflowEvent::SubmissionAccepted {
            session_id: session_id.to_string(),
        });
        info!(%session_id, "attached to existing batch");
        Ok(self.store.dispatch(WorkflowEvent::SnapshotReceived(snapshot)))
    }

    /// Back to an empty idle state. Callers stop their poller first.
    pub fn reset(&self) -> WorkflowState {
        self.store.dispatch(WorkflowEvent::Reset)
    }
}
