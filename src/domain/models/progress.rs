//! Wire types for batch submission and progress snapshots.

use serde::{Deserialize, Serialize};

/// Top-level status of a batch as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn from_backend(status: &str) -> Self {
        match status {
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            "PROCESSING" => Self::Processing,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Per-file entry of a snapshot, addressed by filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileProgress {
    pub filename: String,
    pub status: String,
    pub stage: Option<String>,
    pub progress: Option<f64>,
    pub error_message: Option<String>,
    pub ttn_invoice_id: Option<String>,
}

impl FileProgress {
    /// Progress as a percentage in `0..=100`.
    pub fn percent(&self) -> u8 {
        clamp_percent(self.progress.unwrap_or(0.0))
    }
}

/// Point-in-time progress report for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressSnapshot {
    pub session_id: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub files: Vec<FileProgress>,
    pub zip_download_url: Option<String>,
}

impl ProgressSnapshot {
    pub fn batch_status(&self) -> BatchStatus {
        BatchStatus::from_backend(&self.status)
    }

    pub fn is_terminal(&self) -> bool {
        self.batch_status().is_terminal()
    }

    /// First entry whose filename matches exactly.
    pub fn entry_for(&self, filename: &str) -> Option<&FileProgress> {
        self.files.iter().find(|entry| entry.filename == filename)
    }
}

/// Body returned by the process endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessResponse {
    pub session_id: Option<String>,
    pub message: Option<String>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_parses_backend_payload() {
        let body = r#"{
            "status": "PROCESSING",
            "message": "Signing invoices",
            "files": [
                {"filename": "a.xml", "status": "PROCESSING", "stage": "SIGN", "progress": 40},
                {"filename": "b.xml", "status": "FAILED", "stage": "SAVE", "progress": 20,
                 "errorMessage": "TTN rejected", "ttnInvoiceId": null}
            ],
            "zipDownloadUrl": null
        }"#;

        let snapshot: ProgressSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.batch_status(), BatchStatus::Processing);
        assert!(!snapshot.is_terminal());
        assert_eq!(snapshot.files.len(), 2);
        assert_eq!(snapshot.files[0].percent(), 40);
        assert_eq!(
            snapshot.entry_for("b.xml").and_then(|e| e.error_message.as_deref()),
            Some("TTN rejected")
        );
        assert!(snapshot.entry_for("c.xml").is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(BatchStatus::from_backend("COMPLETED").is_terminal());
        assert!(BatchStatus::from_backend("FAILED").is_terminal());
        assert!(!BatchStatus::from_backend("PROCESSING").is_terminal());
        assert!(!BatchStatus::from_backend("").is_terminal());
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot: ProgressSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.files.is_empty());
        assert_eq!(snapshot.batch_status(), BatchStatus::Pending);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-5.0), 0);
        assert_eq!(clamp_percent(42.5), 43);
        assert_eq!(clamp_percent(180.0), 100);
        assert_eq!(clamp_percent(f64::NAN), 0);
    }
}
