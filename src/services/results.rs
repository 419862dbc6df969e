//! Terminal results and archive download.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::WorkflowResults;
use crate::domain::ports::{StorageError, WorkflowApi};

/// File-name prefix of downloaded result archives.
pub const ARCHIVE_PREFIX: &str = "iconesign-results";

/// `<prefix>-<timestamp>.zip`, with the timestamp safe for file names.
pub fn archive_file_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}-{}.zip", now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

/// Saves result archives. Never touches workflow state.
pub struct ArchiveDownloader {
    api: Arc<dyn WorkflowApi>,
}

impl ArchiveDownloader {
    pub fn new(api: Arc<dyn WorkflowApi>) -> Self {
        Self { api }
    }

    /// Download `url` into `dir`. Returns the written path.
    pub async fn download(&self, url: &str, dir: &Path) -> DomainResult<PathBuf> {
        let bytes = self.api.download_archive(url).await?;
        let path = dir.join(archive_file_name(ARCHIVE_PREFIX, Utc::now()));

        tokio::fs::create_dir_all(dir).await.map_err(|source| {
            DomainError::Storage(StorageError::Io {
                path: dir.display().to_string(),
                source,
            })
        })?;
        tokio::fs::write(&path, &bytes).await.map_err(|source| {
            DomainError::Storage(StorageError::Io {
                path: path.display().to_string(),
                source,
            })
        })?;

        info!(path = %path.display(), bytes = bytes.len(), "archive saved");
        Ok(path)
    }

    /// Download the archive of a finished batch, if it has one.
    pub async fn download_results(
        &self,
        results: &WorkflowResults,
        dir: &Path,
    ) -> DomainResult<Option<PathBuf>> {
        match results.zip_download_url.as_deref() {
            Some(url) if !url.is_empty() => self.download(url, dir).await.map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FileHandle, ProcessResponse, ProgressSnapshot};
    use crate::domain::ports::ApiError;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct ZipApi;

    #[async_trait]
    impl WorkflowApi for ZipApi {
        async fn process_invoices(&self, _: &[FileHandle]) -> Result<ProcessResponse, ApiError> {
            Ok(ProcessResponse::default())
        }

        async fn fetch_progress(&self, _: &str) -> Result<ProgressSnapshot, ApiError> {
            Ok(ProgressSnapshot::default())
        }

        async fn download_archive(&self, url: &str) -> Result<Vec<u8>, ApiError> {
            Ok(url.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_archive_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 5).unwrap();
        assert_eq!(
            archive_file_name("iconesign-results", now),
            "iconesign-results-2024-06-15T12-30-05-000Z.zip"
        );
    }

    #[tokio::test]
    async fn test_download_results_without_url_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ArchiveDownloader::new(Arc::new(ZipApi));
        let results = WorkflowResults::from_files(true, Vec::new(), None, "done");
        assert!(downloader
            .download_results(&results, dir.path())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_download_writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ArchiveDownloader::new(Arc::new(ZipApi));
        let results = WorkflowResults::from_files(
            true,
            Vec::new(),
            Some("/download/s-1.zip".to_string()),
            "done",
        );

        let path = downloader
            .download_results(&results, dir.path())
            .await
            .unwrap()
            .unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().ends_with(".zip"));
        assert_eq!(std::fs::read(path).unwrap(), b"/download/s-1.zip");
    }
}
