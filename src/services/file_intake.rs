//! File intake: accept or reject user-picked files before they join a batch.

use serde::Serialize;

use crate::domain::models::{FileHandle, IntakeConfig, WorkflowFile};

const XML_MIME_TYPES: [&str; 2] = ["text/xml", "application/xml"];
const XML_EXTENSION: &str = ".xml";

/// Size and content rules for one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakePolicy {
    pub max_bytes: u64,
    /// Zero-byte files are refused by the direct signing workflow only.
    pub reject_empty: bool,
}

impl IntakePolicy {
    /// Rules for the batch upload / process workflow.
    pub fn upload(config: &IntakeConfig) -> Self {
        Self {
            max_bytes: config.upload_max_bytes,
            reject_empty: false,
        }
    }

    /// Rules for direct sign and validate.
    pub fn batch_sign(config: &IntakeConfig) -> Self {
        Self {
            max_bytes: config.batch_sign_max_bytes,
            reject_empty: true,
        }
    }

    /// One diagnostic per violated rule. Empty means accepted.
    pub fn check(&self, file: &FileHandle) -> Vec<String> {
        let mut reasons = Vec::new();

        if !is_xml(file) {
            reasons.push(format!(
                "{}: unsupported file format, only XML files are accepted",
                file.name
            ));
        }
        if file.size > self.max_bytes {
            reasons.push(format!(
                "{}: file too large ({}), maximum allowed is {}",
                file.name,
                format_megabytes(file.size),
                format_megabytes(self.max_bytes)
            ));
        }
        if self.reject_empty && file.size == 0 {
            reasons.push(format!("{}: file is empty", file.name));
        }

        reasons
    }

    /// Split candidates into accepted files (wrapped with fresh ids) and
    /// rejections.
    pub fn partition(&self, files: Vec<FileHandle>) -> IntakeOutcome {
        let mut outcome = IntakeOutcome::default();
        for file in files {
            let reasons = self.check(&file);
            if reasons.is_empty() {
                outcome.accepted.push(WorkflowFile::new(file));
            } else {
                tracing::debug!(file = %file.name, ?reasons, "file rejected");
                outcome.rejected.push(Rejection { file, reasons });
            }
        }
        outcome
    }
}

fn is_xml(file: &FileHandle) -> bool {
    let mime_ok = file
        .content_type
        .as_deref()
        .is_some_and(|ct| XML_MIME_TYPES.contains(&ct));
    mime_ok || file.name.to_lowercase().ends_with(XML_EXTENSION)
}

#[allow(clippy::cast_precision_loss)]
fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub file: FileHandle,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IntakeOutcome {
    pub accepted: Vec<WorkflowFile>,
    pub rejected: Vec<Rejection>,
}

impl IntakeOutcome {
    pub fn diagnostics(&self) -> impl Iterator<Item = &str> {
        self.rejected
            .iter()
            .flat_map(|r| r.reasons.iter().map(String::as_str))
    }
}
