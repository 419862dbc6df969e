//! Inspect or follow a batch by session id.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use super::process::{follow, BatchOutput};
use crate::cli::context::AppContext;
use crate::cli::display::{output, CommandOutput};
use crate::domain::models::{ProgressSnapshot, WorkflowState};
use crate::domain::ports::WorkflowApi;
use crate::services::{ArchiveDownloader, IntakePolicy, PollerConfig, WorkflowOrchestrator, WorkflowStore};

#[derive(Args, Debug)]
pub struct ProgressArgs {
    /// Session id returned when the batch was submitted
    pub session_id: String,

    /// Keep polling until the batch finishes
    #[arg(short, long)]
    pub watch: bool,

    /// Save the results archive into this directory once finished
    #[arg(short, long)]
    pub download: Option<PathBuf>,

    /// Override the progress polling interval (milliseconds)
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

/// Raw snapshot for batches whose file list is empty.
#[derive(Debug, serde::Serialize)]
struct SnapshotOutput {
    session_id: String,
    snapshot: ProgressSnapshot,
}

impl CommandOutput for SnapshotOutput {
    fn to_human(&self) -> String {
        format!(
            "Session {}: {}{}",
            self.session_id,
            self.snapshot.status,
            self.snapshot
                .message
                .as_deref()
                .map(|m| format!(" ({m})"))
                .unwrap_or_default()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ProgressArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let client = ctx.client()?;
    let snapshot = client
        .fetch_progress(&args.session_id)
        .await
        .with_context(|| format!("Failed to fetch progress for session {}", args.session_id))?;

    if snapshot.files.is_empty() {
        output(
            &SnapshotOutput {
                session_id: args.session_id,
                snapshot,
            },
            json_mode,
        );
        return Ok(());
    }

    let store = WorkflowStore::new();
    let orchestrator = WorkflowOrchestrator::new(
        client.clone(),
        store.clone(),
        IntakePolicy::upload(&ctx.config.intake),
    );
    let mut state: WorkflowState = orchestrator.attach(&args.session_id, snapshot)?;

    if args.watch && state.is_processing() {
        let mut config = PollerConfig::from(&ctx.config.polling);
        if let Some(ms) = args.interval_ms.filter(|ms| *ms > 0) {
            config.interval = Duration::from_millis(ms);
        }
        if follow(client.clone(), &store, config, json_mode).await? {
            return Ok(());
        }
        state = store.snapshot();
    }

    let archive = match (&args.download, &state.results) {
        (Some(dir), Some(results)) => {
            ArchiveDownloader::new(client.clone())
                .download_results(results, dir)
                .await?
        }
        _ => None,
    };

    output(&BatchOutput::from_state(&state).with_archive(archive), json_mode);
    Ok(())
}
