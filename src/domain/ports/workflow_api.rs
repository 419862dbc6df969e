//! Batch workflow port.

use async_trait::async_trait;

use crate::domain::models::{FileHandle, ProcessResponse, ProgressSnapshot};
use crate::domain::ports::errors::ApiError;

/// Port for the batch workflow endpoints
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Submit every file of a batch in one multipart request
    async fn process_invoices(&self, files: &[FileHandle]) -> Result<ProcessResponse, ApiError>;

    /// Fetch the current progress snapshot of a submitted batch
    async fn fetch_progress(&self, session_id: &str) -> Result<ProgressSnapshot, ApiError>;

    /// Download a result archive. Relative URLs resolve against the backend host.
    async fn download_archive(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}
