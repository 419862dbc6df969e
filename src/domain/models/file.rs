//! Invoice files tracked through a processing batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Reference to a document the user picked. The bytes stay on disk and are
/// only read when the batch is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    /// Declared MIME type, when the caller knows one.
    pub content_type: Option<String>,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            size,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Stat a file on disk.
    pub async fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await?;
        Ok(Self::new(path, metadata.len()))
    }
}

/// Lifecycle of a file inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl FileStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Map the backend's upper-case vocabulary onto the four local values.
    /// Anything unrecognised is treated as not yet started.
    pub fn from_backend(status: &str) -> Self {
        match status {
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Error,
            "PROCESSING" => Self::Processing,
            _ => Self::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a file sits in the pipeline. Variants are declared in pipeline
/// order so the derived `Ord` is the advancement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStage {
    Upload,
    Sign,
    Save,
    Validate,
    Transform,
    Package,
    Complete,
}

impl FileStage {
    pub fn parse(stage: &str) -> Option<Self> {
        match stage.to_lowercase().as_str() {
            "upload" => Some(Self::Upload),
            "sign" => Some(Self::Sign),
            "save" => Some(Self::Save),
            "validate" => Some(Self::Validate),
            "transform" => Some(Self::Transform),
            "package" => Some(Self::Package),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Sign => "sign",
            Self::Save => "save",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Package => "package",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-submitted document under processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFile {
    pub id: Uuid,
    pub file: FileHandle,
    pub status: FileStatus,
    pub stage: FileStage,
    pub progress: u8,
    pub error: Option<String>,
    pub ttn_invoice_id: Option<String>,
}

impl WorkflowFile {
    /// Wrap an accepted file with a fresh id in its initial state.
    pub fn new(file: FileHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            status: FileStatus::Pending,
            stage: FileStage::Upload,
            progress: 0,
            error: None,
            ttn_invoice_id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_file_starts_pending_at_upload() {
        let file = WorkflowFile::new(FileHandle::new("/tmp/invoice-1.xml", 512));
        assert_eq!(file.status, FileStatus::Pending);
        assert_eq!(file.stage, FileStage::Upload);
        assert_eq!(file.progress, 0);
        assert_eq!(file.name(), "invoice-1.xml");
        assert!(file.error.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = WorkflowFile::new(FileHandle::new("a.xml", 1));
        let b = WorkflowFile::new(FileHandle::new("a.xml", 1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_backend_status_mapping() {
        assert_eq!(FileStatus::from_backend("COMPLETED"), FileStatus::Completed);
        assert_eq!(FileStatus::from_backend("FAILED"), FileStatus::Error);
        assert_eq!(FileStatus::from_backend("PROCESSING"), FileStatus::Processing);
        assert_eq!(FileStatus::from_backend("QUEUED"), FileStatus::Pending);
        assert_eq!(FileStatus::from_backend("completed"), FileStatus::Pending);
    }

    #[test]
    fn test_stage_order() {
        assert!(FileStage::Upload < FileStage::Sign);
        assert!(FileStage::Sign < FileStage::Save);
        assert!(FileStage::Save < FileStage::Validate);
        assert!(FileStage::Validate < FileStage::Transform);
        assert!(FileStage::Transform < FileStage::Package);
        assert!(FileStage::Package < FileStage::Complete);
    }

    #[test]
    fn test_stage_parse_is_case_insensitive() {
        assert_eq!(FileStage::parse("VALIDATE"), Some(FileStage::Validate));
        assert_eq!(FileStage::parse("Transform"), Some(FileStage::Transform));
        assert_eq!(FileStage::parse("archive"), None);
    }
}
