//! Local archive of a batch-sign run.
//!
//! Layout:
//!
//! ```text
//! signed-files/signed-<name>
//! validation-reports/validation-report-<base>.json
//! resume-traitement.txt
//! ```
//!
//! Signed documents are included even when a later step failed for them.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::results::archive_file_name;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BatchSignResult, SignedFile};
use crate::domain::ports::StorageError;

/// File-name prefix of local sign packages.
pub const PACKAGE_PREFIX: &str = "iconesign-signed";
/// Name of the run summary inside the package.
pub const SUMMARY_FILE: &str = "resume-traitement.txt";
const SIGNED_DIR: &str = "signed-files";
const REPORTS_DIR: &str = "validation-reports";

/// File name without its last extension.
fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Why a signed file did not clear every step, if it did not.
fn failure_reason(result: &BatchSignResult, file: &SignedFile) -> Option<String> {
    if !file.is_usable() {
        return Some(
            file.error
                .clone()
                .unwrap_or_else(|| "Signing failed".to_string()),
        );
    }
    if let Some(save) = result
        .ttn_results
        .iter()
        .find(|r| r.file_name == file.filename && !r.success)
    {
        return Some(save.error.clone().unwrap_or_else(|| "TTN save failed".to_string()));
    }
    match result
        .validation_results
        .iter()
        .find(|r| r.file_name == file.filename)
    {
        Some(v) if v.is_valid => None,
        Some(v) => Some(
            v.error
                .clone()
                .unwrap_or_else(|| "Signature is not valid".to_string()),
        ),
        None => Some("Not validated".to_string()),
    }
}

/// Plain-text report placed at the root of the archive.
pub fn summary_text(result: &BatchSignResult, now: DateTime<Utc>) -> String {
    let mut details = Vec::with_capacity(result.signed_files.len());
    let mut succeeded = 0;
    for file in &result.signed_files {
        match failure_reason(result, file) {
            None => {
                succeeded += 1;
                details.push(format!("[OK]     {} - signed and validated", file.filename));
            }
            Some(reason) => details.push(format!("[FAILED] {} - {reason}", file.filename)),
        }
    }

    format!(
        "Batch signing report\n\
         ====================\n\
         Date: {}\n\
         Files processed: {}\n\
         Succeeded: {succeeded}\n\
         Failed: {}\n\
         \n\
         Details:\n\
         {}\n\
         \n\
         Signed documents are in '{SIGNED_DIR}'.\n\
         Validation reports are in '{REPORTS_DIR}'.\n",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        result.signed_files.len(),
        result.signed_files.len() - succeeded,
        details.join("\n"),
    )
}

/// Build the archive in memory.
pub fn build_package(result: &BatchSignResult, now: DateTime<Utc>) -> DomainResult<Vec<u8>> {
    let archive_error = |e: zip::result::ZipError| StorageError::Archive(e.to_string());
    let write_error = |e: std::io::Error| StorageError::Archive(e.to_string());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for file in result.signed_files.iter().filter(|f| f.is_usable()) {
        zip.start_file(format!("{SIGNED_DIR}/signed-{}", file.filename), options)
            .map_err(archive_error)?;
        zip.write_all(file.signed_xml.as_bytes()).map_err(write_error)?;

        if let Some(validation) = result
            .validation_results
            .iter()
            .find(|r| r.file_name == file.filename)
        {
            let report = serde_json::to_vec_pretty(validation).map_err(StorageError::from)?;
            zip.start_file(
                format!(
                    "{REPORTS_DIR}/validation-report-{}.json",
                    base_name(&file.filename)
                ),
                options,
            )
            .map_err(archive_error)?;
            zip.write_all(&report).map_err(write_error)?;
        }
    }

    zip.start_file(SUMMARY_FILE, options).map_err(archive_error)?;
    zip.write_all(summary_text(result, now).as_bytes())
        .map_err(write_error)?;

    let cursor = zip.finish().map_err(archive_error)?;
    Ok(cursor.into_inner())
}

/// Write `<prefix>-<timestamp>.zip` into `dir`. Returns the written path.
pub async fn write_package(result: &BatchSignResult, dir: &Path) -> DomainResult<PathBuf> {
    let now = Utc::now();
    let bytes = build_package(result, now)?;
    let path = dir.join(archive_file_name(PACKAGE_PREFIX, now));

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

    info!(path = %path.display(), bytes = bytes.len(), "sign package saved");
    Ok(path)
}
