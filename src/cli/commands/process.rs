//! Quick-sign workflow: submit a batch and follow it to completion.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::stat_files;
use crate::cli::context::AppContext;
use crate::cli::display::{
    action_failure, action_success, action_warning, colorize_status, format_bytes, list_table,
    or_dash, output, render_list, truncate_ellipsis, CommandOutput,
};
use crate::cli::output::{stage_lines, WorkflowView};
use crate::domain::models::{
    ActivityKind, ActivityRecord, Phase, WorkflowFile, WorkflowResults, WorkflowState,
};
use crate::domain::ports::WorkflowApi;
use crate::services::{
    ArchiveDownloader, IntakePolicy, PollerConfig, ProgressPoller, StopReason,
    WorkflowOrchestrator, WorkflowStore,
};

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// XML invoices to submit
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Submit and print the session id without waiting for results
    #[arg(long)]
    pub no_wait: bool,

    /// Save the results archive into this directory when the batch finishes
    #[arg(short, long)]
    pub download: Option<PathBuf>,

    /// Override the progress polling interval (milliseconds)
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
pub struct FileRow {
    pub name: String,
    pub status: String,
    pub stage: String,
    pub progress: u8,
    pub error: Option<String>,
    pub ttn_invoice_id: Option<String>,
}

impl From<&WorkflowFile> for FileRow {
    fn from(file: &WorkflowFile) -> Self {
        Self {
            name: file.name().to_string(),
            status: file.status.as_str().to_string(),
            stage: file.stage.as_str().to_string(),
            progress: file.progress,
            error: file.error.clone(),
            ttn_invoice_id: file.ttn_invoice_id.clone(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ResultsSummary {
    pub success: bool,
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub success_rate: u8,
    pub message: String,
    pub zip_download_url: Option<String>,
}

impl From<&WorkflowResults> for ResultsSummary {
    fn from(results: &WorkflowResults) -> Self {
        Self {
            success: results.success,
            total_files: results.total_files,
            successful_files: results.successful_files,
            failed_files: results.failed_files,
            success_rate: results.success_rate(),
            message: results.message.clone(),
            zip_download_url: results.zip_download_url.clone(),
        }
    }
}

/// A batch as seen by the user: shared by `process` and `progress`.
#[derive(Debug, serde::Serialize)]
pub struct BatchOutput {
    pub session_id: Option<String>,
    pub phase: Phase,
    pub current_stage: String,
    pub overall_progress: u8,
    pub files: Vec<FileRow>,
    pub results: Option<ResultsSummary>,
    pub archive_path: Option<PathBuf>,
    #[serde(skip)]
    stages: Vec<String>,
}

impl BatchOutput {
    pub fn from_state(state: &WorkflowState) -> Self {
        Self {
            session_id: state.session_id.clone(),
            phase: state.phase,
            current_stage: state.current_stage.clone(),
            overall_progress: state.overall_progress,
            files: state.files.iter().map(FileRow::from).collect(),
            results: state.results.as_ref().map(ResultsSummary::from),
            archive_path: None,
            stages: stage_lines(&state.files),
        }
    }

    #[must_use]
    pub fn with_archive(mut self, path: Option<PathBuf>) -> Self {
        self.archive_path = path;
        self
    }
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if let Some(session_id) = &self.session_id {
            lines.push(format!("{} {}", "Session:".bold(), session_id));
        }
        lines.push(format!(
            "{} {} ({}%)",
            "Status:".bold(),
            self.current_stage,
            self.overall_progress
        ));
        lines.extend(self.stages.iter().map(|l| format!("  {l}")));
        lines.push(String::new());

        let mut table = list_table(&["File", "Status", "Stage", "Progress", "TTN id", "Error"]);
        for file in &self.files {
            table.add_row(vec![
                truncate_ellipsis(&file.name, 40),
                colorize_status(&file.status).to_string(),
                file.stage.clone(),
                format!("{}%", file.progress),
                or_dash(file.ttn_invoice_id.as_deref()),
                truncate_ellipsis(&or_dash(file.error.as_deref()), 50),
            ]);
        }
        lines.push(render_list("file", table, self.files.len()));

        if let Some(results) = &self.results {
            lines.push(String::new());
            let summary = format!(
                "{}: {}/{} files succeeded ({}%), {} failed",
                results.message,
                results.successful_files,
                results.total_files,
                results.success_rate,
                results.failed_files
            );
            lines.push(if results.success {
                action_success(&summary)
            } else {
                action_failure(&summary)
            });
            match (&self.archive_path, &results.zip_download_url) {
                (Some(path), _) => lines.push(format!("Archive saved to {}", path.display())),
                (None, Some(url)) => lines.push(format!(
                    "Archive available: {url} (iconesign download {url})"
                )),
                (None, None) => {}
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Batch accepted, not followed.
#[derive(Debug, serde::Serialize)]
pub struct SubmittedOutput {
    pub session_id: String,
    pub files: Vec<String>,
}

impl CommandOutput for SubmittedOutput {
    fn to_human(&self) -> String {
        format!(
            "{}\nFollow it with: iconesign progress {} --watch",
            action_success(&format!(
                "Submitted {} file(s), session {}",
                self.files.len(),
                self.session_id
            )),
            self.session_id
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Render store changes until the batch leaves `Processing` or the user
/// interrupts. Returns `true` when interrupted.
pub(crate) async fn follow(
    api: Arc<dyn WorkflowApi>,
    store: &WorkflowStore,
    config: PollerConfig,
    json_mode: bool,
) -> Result<bool> {
    let poller = Arc::new(ProgressPoller::new(api, store.clone(), config));
    let handle = poller.spawn();

    let mut view = WorkflowView::new(json_mode);
    let mut rx = store.subscribe();
    view.render(&rx.borrow_and_update());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    while store.phase() == Phase::Processing {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                view.render(&state);
            }
            _ = &mut ctrl_c => {
                interrupted = true;
                break;
            }
        }
    }

    poller.stop();
    let reason = handle.await.context("Progress poller task panicked")?;
    view.render(&store.snapshot());
    view.finish();

    if reason == StopReason::MissingSessionId {
        bail!("The batch has no session id to follow");
    }
    if interrupted {
        if let Some(session_id) = store.session_id() {
            view.println(action_warning(&format!(
                "Stopped following. Resume with: iconesign progress {session_id} --watch"
            )));
        }
    }
    Ok(interrupted)
}

fn file_names(files: &[WorkflowFile]) -> Vec<String> {
    files.iter().map(|f| f.name().to_string()).collect()
}

pub async fn execute(args: ProcessArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let token = ctx.auth_service()?.require_access().await?;
    let client = ctx.client_with_token(Some(token))?;

    let store = WorkflowStore::new();
    let orchestrator = WorkflowOrchestrator::new(
        client.clone(),
        store.clone(),
        IntakePolicy::upload(&ctx.config.intake),
    );

    let outcome = orchestrator.add_files(stat_files(&args.files).await?);
    for reason in outcome.diagnostics() {
        eprintln!("{}", action_warning(reason));
    }
    if outcome.accepted.is_empty() {
        bail!("No valid XML files to process");
    }

    let names = file_names(&outcome.accepted);
    let total_size: u64 = outcome.accepted.iter().map(|f| f.file.size).sum();
    ctx.activity
        .track(
            ActivityRecord::new(ActivityKind::QuickSign, "files_uploaded")
                .with_files(names.clone(), total_size),
        )
        .await;
    if !json_mode {
        eprintln!(
            "Submitting {} file(s), {}",
            names.len(),
            format_bytes(total_size)
        );
    }

    let started = Instant::now();
    ctx.activity
        .track(
            ActivityRecord::new(ActivityKind::QuickSign, "process_started")
                .with_files(names.clone(), total_size),
        )
        .await;

    let state = orchestrator.start().await?;
    if let (Phase::Processing, Some(session_id), true) =
        (state.phase, state.session_id.clone(), args.no_wait)
    {
        output(&SubmittedOutput { session_id, files: names }, json_mode);
        return Ok(());
    }

    if state.phase == Phase::Processing {
        let mut config = PollerConfig::from(&ctx.config.polling);
        if let Some(ms) = args.interval_ms.filter(|ms| *ms > 0) {
            config.interval = Duration::from_millis(ms);
        }
        if follow(client.clone(), &store, config, json_mode).await? {
            return Ok(());
        }
    }

    let final_state = store.snapshot();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let Some(results) = final_state.results.clone() else {
        bail!("Batch ended without results");
    };

    let record = if results.success {
        ActivityRecord::new(ActivityKind::QuickSign, "process_completed")
    } else {
        ActivityRecord::new(ActivityKind::QuickSign, "process_error").with_error(&results.message)
    };
    ctx.activity
        .track(
            record
                .with_files(names.clone(), total_size)
                .with_counts(results.total_files, results.successful_files, results.failed_files)
                .with_duration_ms(elapsed_ms),
        )
        .await;
    info!(
        success = results.success,
        successful = results.successful_files,
        failed = results.failed_files,
        elapsed_ms,
        "batch finished"
    );

    let mut archive = None;
    if let Some(dir) = &args.download {
        archive = ArchiveDownloader::new(client.clone())
            .download_results(&results, dir)
            .await?;
        if archive.is_some() {
            ctx.activity
                .track(
                    ActivityRecord::new(ActivityKind::QuickSign, "results_downloaded")
                        .with_files(names, total_size),
                )
                .await;
        }
    }

    output(
        &BatchOutput::from_state(&final_state).with_archive(archive),
        json_mode,
    );
    if !results.success {
        bail!("Batch finished with errors: {}", results.message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FileHandle, WorkflowEvent};

    fn failed_state() -> WorkflowState {
        WorkflowState::default()
            .reduce(WorkflowEvent::FilesAdded(vec![WorkflowFile::new(FileHandle::new(
                "a.xml", 10,
            ))]))
            .reduce(WorkflowEvent::ProcessingStarted)
            .reduce(WorkflowEvent::SubmissionFailed {
                message: "HTTP 413: Payload Too Large".to_string(),
            })
    }

    #[test]
    fn test_batch_output_json_shape() {
        let json = BatchOutput::from_state(&failed_state()).to_json();
        assert_eq!(json["phase"], "done");
        assert_eq!(json["files"][0]["status"], "error");
        assert_eq!(json["results"]["success"], false);
        assert_eq!(json["results"]["failed_files"], 1);
        assert!(json.get("stages").is_none());
    }

    #[test]
    fn test_batch_output_human_mentions_failure() {
        colored::control::set_override(false);
        let text = BatchOutput::from_state(&failed_state()).to_human();
        assert!(text.contains("a.xml"));
        assert!(text.contains("0/1 files succeeded"));
        assert!(text.contains("HTTP 413"));
    }
}
