//! Stage derivation for display.
//!
//! Everything here is a pure function of the current file list (plus the
//! backend's free-text message for the no-files fallback). Nothing is cached
//! between calls.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::file::{FileStage, FileStatus, WorkflowFile};

/// The five pipeline steps shown to the user, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Sign,
    Save,
    Validate,
    Transform,
    Package,
}

impl PipelineStage {
    pub const ALL: [Self; 5] = [
        Self::Sign,
        Self::Save,
        Self::Validate,
        Self::Transform,
        Self::Package,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Save => "save",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Package => "package",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sign => "Sign (ANCE SEAL)",
            Self::Save => "Save to TTN",
            Self::Validate => "Validate signature",
            Self::Transform => "Transform to HTML",
            Self::Package => "Package archive",
        }
    }

    fn file_stage(self) -> FileStage {
        match self {
            Self::Sign => FileStage::Sign,
            Self::Save => FileStage::Save,
            Self::Validate => FileStage::Validate,
            Self::Transform => FileStage::Transform,
            Self::Package => FileStage::Package,
        }
    }

    /// Pipeline position of a file stage. `Upload` precedes the pipeline;
    /// `Complete` counts as having reached the last step.
    fn of_file(stage: FileStage) -> Option<Self> {
        match stage {
            FileStage::Upload => None,
            FileStage::Sign => Some(Self::Sign),
            FileStage::Save => Some(Self::Save),
            FileStage::Validate => Some(Self::Validate),
            FileStage::Transform => Some(Self::Transform),
            FileStage::Package | FileStage::Complete => Some(Self::Package),
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual state of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
}

/// Keywords tried in order against the lower-cased status message.
const STAGE_KEYWORDS: [(&str, PipelineStage); 5] = [
    ("sign", PipelineStage::Sign),
    ("save", PipelineStage::Save),
    ("validate", PipelineStage::Validate),
    ("transform", PipelineStage::Transform),
    ("package", PipelineStage::Package),
];

/// Most advanced stage among the files, or the keyword fallback when the
/// list is empty.
pub fn aggregate_stage(files: &[WorkflowFile], status_message: &str) -> PipelineStage {
    if files.is_empty() {
        return stage_from_message(status_message);
    }
    files
        .iter()
        .filter_map(|f| PipelineStage::of_file(f.stage))
        .max()
        .unwrap_or(PipelineStage::Sign)
}

/// Infer a stage from free text. Only used when no per-file data exists.
pub fn stage_from_message(message: &str) -> PipelineStage {
    let message = message.to_lowercase();
    STAGE_KEYWORDS
        .iter()
        .find(|(keyword, _)| message.contains(keyword))
        .map_or(PipelineStage::Sign, |(_, stage)| *stage)
}

fn has_passed(file: &WorkflowFile, stage: PipelineStage) -> bool {
    let target = stage.file_stage();
    file.stage > target || (file.stage == target && file.status == FileStatus::Completed)
}

/// Active if any file is mid-stage here; completed once every file has passed
/// or finished it; pending otherwise.
pub fn stage_status(stage: PipelineStage, files: &[WorkflowFile]) -> StageStatus {
    if files.is_empty() {
        return StageStatus::Pending;
    }
    let target = stage.file_stage();
    if files
        .iter()
        .any(|f| f.stage == target && f.status == FileStatus::Processing)
    {
        return StageStatus::Active;
    }
    if files.iter().all(|f| has_passed(f, stage)) {
        return StageStatus::Completed;
    }
    StageStatus::Pending
}

/// Percentage shown next to a stage.
#[allow(clippy::cast_precision_loss)]
pub fn stage_progress(stage: PipelineStage, files: &[WorkflowFile]) -> u8 {
    if files.is_empty() {
        return 0;
    }
    let passed = files.iter().filter(|f| has_passed(f, stage)).count();
    if passed == files.len() {
        return 100;
    }

    let target = stage.file_stage();
    let in_stage: Vec<&WorkflowFile> = files.iter().filter(|f| f.stage == target).collect();
    if !in_stage.is_empty() {
        let total: u64 = in_stage.iter().map(|f| u64::from(f.progress)).sum();
        return super::progress::clamp_percent(total as f64 / in_stage.len() as f64);
    }

    if passed > 0 {
        return super::progress::clamp_percent(passed as f64 / files.len() as f64 * 100.0);
    }
    0
}
