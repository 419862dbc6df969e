//! Live rendering of a batch: overall bar, pipeline steps, one bar per file.

use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use super::progress::{MultiProgressManager, ProgressBarExt};
use crate::cli::display::{stage_marker, truncate_ellipsis};
use crate::domain::models::stage::{stage_progress, stage_status};
use crate::domain::models::{FileStatus, Phase, PipelineStage, WorkflowFile, WorkflowState};

const NAME_WIDTH: usize = 28;

/// `✓ Sign (ANCE SEAL) 100%` for each pipeline step.
pub fn stage_lines(files: &[WorkflowFile]) -> Vec<String> {
    PipelineStage::ALL
        .iter()
        .map(|&stage| {
            format!(
                "{} {:<20} {:>3}%",
                stage_marker(stage_status(stage, files)),
                stage.label(),
                stage_progress(stage, files)
            )
        })
        .collect()
}

fn file_message(file: &WorkflowFile) -> String {
    match (&file.error, file.status) {
        (Some(error), FileStatus::Error) => format!("{}: {error}", file.status),
        _ => format!("{} ({})", file.status, file.stage),
    }
}

/// Redraws from whole [`WorkflowState`] values; keeps no state of its own
/// beyond the bar handles.
pub struct WorkflowView {
    manager: MultiProgressManager,
    overall: ProgressBar,
    stages: ProgressBar,
    files: HashMap<Uuid, ProgressBar>,
}

impl WorkflowView {
    pub fn new(hidden: bool) -> Self {
        let manager = if hidden {
            MultiProgressManager::hidden()
        } else {
            MultiProgressManager::new()
        };
        let overall = manager.add_percent_bar("Overall");
        let stages = manager.inner().add(ProgressBar::new(1));
        stages.set_style(
            ProgressStyle::with_template("  {msg}").unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self {
            manager,
            overall,
            stages,
            files: HashMap::new(),
        }
    }

    pub fn render(&mut self, state: &WorkflowState) {
        self.overall
            .set_progress(u64::from(state.overall_progress), state.current_stage.clone());
        self.stages.set_message(stage_lines(&state.files).join("  "));

        for file in &state.files {
            let bar = self.files.entry(file.id).or_insert_with(|| {
                self.manager
                    .add_percent_bar(truncate_ellipsis(file.name(), NAME_WIDTH))
            });
            if bar.is_finished() {
                continue;
            }
            bar.set_progress(u64::from(file.progress), file_message(file));
            match file.status {
                FileStatus::Completed => bar.finish_success(file_message(file)),
                FileStatus::Error => bar.finish_error(file_message(file)),
                FileStatus::Pending | FileStatus::Processing => {}
            }
        }

        if state.phase == Phase::Done {
            let message = state
                .results
                .as_ref()
                .map_or_else(|| state.current_stage.clone(), |r| r.message.clone());
            match &state.results {
                Some(results) if results.success => self.overall.finish_success(message),
                _ => self.overall.finish_error(message),
            }
            self.stages.finish();
        }
    }

    /// Leave the bars on screen.
    pub fn finish(&self) {
        if !self.overall.is_finished() {
            self.overall.finish_warning("stopped");
        }
        for bar in self.files.values().filter(|b| !b.is_finished()) {
            bar.abandon();
        }
        if !self.stages.is_finished() {
            self.stages.finish();
        }
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.manager.println(line);
    }
}
