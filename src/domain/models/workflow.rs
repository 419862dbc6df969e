//! Client-side workflow state machine.
//!
//! The whole batch lives in one [`WorkflowState`] value that only changes by
//! folding a [`WorkflowEvent`] through [`WorkflowState::reduce`]:
//!
//! ```text
//! Idle ──ProcessingStarted──▶ Processing ──SnapshotReceived(terminal)──▶ Done
//!                                 │                                       │
//!                                 └──────────SubmissionFailed─────────────┘
//! any ──Reset──▶ Idle
//! ```
//!
//! While `Processing`, file state is written only by snapshot merges, so the
//! submit handler and the poller never race on the same file.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::file::{FileStage, FileStatus, WorkflowFile};
use super::progress::{BatchStatus, ProgressSnapshot};

/// Progress shown on every file as soon as the batch starts, before the first
/// real snapshot arrives.
pub const STARTED_PROGRESS: u8 = 10;

/// Batch message while idle.
pub const READY_MESSAGE: &str = "Ready";

/// Externally visible phase of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No active batch.
    #[default]
    Idle,
    /// Submitted, waiting for a terminal snapshot.
    Processing,
    /// Terminal snapshot received, successful or not.
    Done,
}

/// Terminal summary of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResults {
    /// Whether the backend reported the batch as completed.
    pub success: bool,
    pub total_files: usize,
    /// Files that ended `completed`.
    pub successful_files: usize,
    /// Files that ended in `error`.
    pub failed_files: usize,
    /// Archive of the signed documents, absolute or relative to the API.
    pub zip_download_url: Option<String>,
    /// Summary line from the backend, or a local default.
    pub message: String,
    /// Per-file rows as they stood when the batch finished.
    pub files: Vec<WorkflowFile>,
}

impl WorkflowResults {
    pub fn from_files(
        success: bool,
        files: Vec<WorkflowFile>,
        zip_download_url: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        let successful_files = files
            .iter()
            .filter(|f| f.status == FileStatus::Completed)
            .count();
        let failed_files = files
            .iter()
            .filter(|f| f.status == FileStatus::Error)
            .count();
        Self {
            success,
            total_files: files.len(),
            successful_files,
            failed_files,
            zip_download_url,
            message: message.into(),
            files,
        }
    }

    /// `round(successful / total * 100)`, 0 for an empty batch.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> u8 {
        if self.total_files == 0 {
            return 0;
        }
        super::progress::clamp_percent(
            self.successful_files as f64 / self.total_files as f64 * 100.0,
        )
    }
}

/// Everything that can happen to a batch.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// Files that passed intake join the list.
    FilesAdded(Vec<WorkflowFile>),
    /// Drop one file by id.
    FileRemoved(Uuid),
    /// Drop every file.
    FilesCleared,
    /// User started the batch; files switch to the optimistic started state.
    ProcessingStarted,
    /// Backend took the batch and issued a session id.
    SubmissionAccepted { session_id: String },
    /// The submission call failed or came back without a session id.
    SubmissionFailed { message: String },
    /// A progress report fetched for the active session.
    SnapshotReceived(ProgressSnapshot),
    /// Clear files, results, session id and phase in one step.
    Reset,
}

/// In-memory state of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub phase: Phase,
    pub files: Vec<WorkflowFile>,
    pub results: Option<WorkflowResults>,
    /// Human-readable status line.
    pub current_stage: String,
    pub overall_progress: u8,
    pub session_id: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            files: Vec::new(),
            results: None,
            current_stage: READY_MESSAGE.to_string(),
            overall_progress: 0,
            session_id: None,
        }
    }
}

impl WorkflowState {
    pub fn is_processing(&self) -> bool {
        self.phase == Phase::Processing
    }

    /// Apply one event and return the next state.
    pub fn reduce(mut self, event: WorkflowEvent) -> Self {
        match event {
            WorkflowEvent::FilesAdded(files) => {
                if self.is_processing() {
                    debug!("ignoring added files while a batch is processing");
                    return self;
                }
                self.files.extend(files);
            }
            WorkflowEvent::FileRemoved(id) => {
                if self.is_processing() {
                    debug!(%id, "ignoring file removal while a batch is processing");
                    return self;
                }
                self.files.retain(|f| f.id != id);
            }
            WorkflowEvent::FilesCleared => {
                if self.is_processing() {
                    debug!("ignoring clear while a batch is processing");
                    return self;
                }
                self.files.clear();
            }
            WorkflowEvent::ProcessingStarted => {
                if self.phase != Phase::Idle || self.files.is_empty() {
                    debug!(phase = ?self.phase, files = self.files.len(), "start ignored");
                    return self;
                }
                for file in &mut self.files {
                    file.status = FileStatus::Processing;
                    file.stage = FileStage::Sign;
                    file.progress = STARTED_PROGRESS;
                    file.error = None;
                }
                self.phase = Phase::Processing;
                self.current_stage = "Submitting files...".to_string();
                self.overall_progress = overall_progress(&self.files);
            }
            WorkflowEvent::SubmissionAccepted { session_id } => {
                if !self.is_processing() {
                    return self;
                }
                self.current_stage = "Processing files through the IconeSign workflow...".to_string();
                self.session_id = Some(session_id);
            }
            WorkflowEvent::SubmissionFailed { message } => {
                if !self.is_processing() {
                    return self;
                }
                for file in &mut self.files {
                    file.status = FileStatus::Error;
                    file.error = Some(message.clone());
                }
                self.results = Some(WorkflowResults::from_files(
                    false,
                    self.files.clone(),
                    None,
                    message,
                ));
                self.phase = Phase::Done;
                self.current_stage = "An error occurred".to_string();
                self.overall_progress = overall_progress(&self.files);
            }
            WorkflowEvent::SnapshotReceived(snapshot) => {
                if !self.is_processing() {
                    debug!(phase = ?self.phase, "discarding snapshot outside processing");
                    return self;
                }
                if snapshot.session_id.is_some() && snapshot.session_id != self.session_id {
                    debug!(
                        snapshot_session = ?snapshot.session_id,
                        active_session = ?self.session_id,
                        "discarding snapshot for another session"
                    );
                    return self;
                }
                self.apply_snapshot(snapshot);
            }
            WorkflowEvent::Reset => return Self::default(),
        }
        self
    }

    fn apply_snapshot(&mut self, snapshot: ProgressSnapshot) {
        merge_snapshot(&mut self.files, &snapshot);

        let status = snapshot.batch_status();
        if status.is_terminal() {
            let success = status == BatchStatus::Completed;
            let message = snapshot
                .message
                .clone()
                .unwrap_or_else(|| "Processing finished".to_string());
            self.results = Some(WorkflowResults::from_files(
                success,
                self.files.clone(),
                snapshot.zip_download_url,
                message,
            ));
            self.overall_progress = 100;
            self.current_stage = if success {
                "Processing completed successfully".to_string()
            } else {
                "Processing completed with errors".to_string()
            };
            self.phase = Phase::Done;
            return;
        }

        self.overall_progress = overall_progress(&self.files);
        self.current_stage = snapshot.message.unwrap_or_else(|| {
            let stage = super::stage::aggregate_stage(&self.files, "");
            format!("Stage {} in progress...", stage.as_str().to_uppercase())
        });
    }
}

/// Overwrite every local file that has an exact filename match in the
/// snapshot. Unmatched files and files already completed or failed are left
/// untouched.
pub fn merge_snapshot(files: &mut [WorkflowFile], snapshot: &ProgressSnapshot) {
    for file in files.iter_mut() {
        let Some(entry) = snapshot.entry_for(&file.file.name) else {
            continue;
        };
        if file.status.is_terminal() {
            continue;
        }

        let status = FileStatus::from_backend(&entry.status);
        let stage = match entry.stage.as_deref() {
            None | Some("") => FileStage::Sign,
            Some(raw) => FileStage::parse(raw).unwrap_or_else(|| {
                warn!(file = %file.file.name, stage = raw, "unknown stage in snapshot");
                file.stage
            }),
        };

        file.stage = if status == FileStatus::Processing && file.status == FileStatus::Processing {
            stage.max(file.stage)
        } else {
            stage
        };
        file.status = status;
        file.progress = entry.percent();
        file.error.clone_from(&entry.error_message);
        file.ttn_invoice_id.clone_from(&entry.ttn_invoice_id);
    }
}

/// Rounded mean of per-file progress, 0 when there are no files.
#[allow(clippy::cast_precision_loss)]
pub fn overall_progress(files: &[WorkflowFile]) -> u8 {
    if files.is_empty() {
        return 0;
    }
    let total: u64 = files.iter().map(|f| u64::from(f.progress)).sum();
    super::progress::clamp_percent(total as f64 / files.len() as f64)
}
