//! Direct signing pipeline: sign, push to TTN, validate, package.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    BatchSignResult, BatchSummary, FileHandle, SaveOutcome, SignedFile, TtnCredentials,
    ValidationOutcome,
};
use crate::domain::ports::{ApiError, SigningApi};

/// Sign, save to TTN and validate a set of files through the signing service.
pub struct BatchSignService {
    api: Arc<dyn SigningApi>,
    credentials: TtnCredentials,
}

impl BatchSignService {
    pub fn new(api: Arc<dyn SigningApi>, credentials: TtnCredentials) -> Self {
        Self { api, credentials }
    }

    /// Run the whole pipeline over already-accepted files.
    ///
    /// Only a failure of the sign call itself aborts the run; per-file save
    /// and validation failures are reported in the result.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn process(&self, files: &[FileHandle]) -> DomainResult<BatchSignResult> {
        if files.is_empty() {
            return Err(DomainError::NoFiles);
        }
        if !self.credentials.is_configured() {
            return Err(DomainError::TtnCredentialsMissing);
        }

        let started = Instant::now();
        let signed_files = self.api.sign(files).await?;
        let usable: Vec<&SignedFile> = signed_files.iter().filter(|f| f.is_usable()).collect();
        info!(signed = usable.len(), total = files.len(), "signing finished");

        let mut ttn_results = Vec::with_capacity(usable.len());
        for file in &usable {
            ttn_results.push(self.save(file).await);
        }

        let mut validation_results = Vec::with_capacity(usable.len());
        for file in &usable {
            validation_results.push(
                self.validate_bytes(&file.filename, file.signed_xml.clone().into_bytes())
                    .await,
            );
        }

        let summary = BatchSummary::compute(
            files.len(),
            usable.len(),
            ttn_results.iter().filter(|r| r.success).count(),
            validation_results.iter().filter(|r| r.is_valid).count(),
        );

        let mut result = BatchSignResult {
            signed_files,
            validation_results,
            ttn_results,
            download_url: None,
            summary,
        };

        result.download_url = match self.api.create_package(&result).await {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "could not create download package");
                None
            }
        };

        info!(
            elapsed_ms = started.elapsed().as_millis(),
            failed = result.summary.failed,
            "batch sign finished"
        );
        Ok(result)
    }

    /// Validate a signed document read from disk.
    pub async fn validate_file(&self, file: &FileHandle) -> DomainResult<ValidationOutcome> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ApiError::FileRead {
                path: file.path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(self.validate_bytes(&file.name, bytes).await)
    }

    async fn validate_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ValidationOutcome {
        match self.api.validate(file_name, bytes).await {
            Ok(response) => ValidationOutcome::from_response(file_name, response),
            Err(e) => {
                warn!(file = file_name, error = %e, "validation request failed");
                ValidationOutcome::failed(file_name, e.to_string())
            }
        }
    }

    async fn save(&self, file: &SignedFile) -> SaveOutcome {
        match self
            .api
            .save_efact(&file.filename, &file.signed_xml, &self.credentials)
            .await
        {
            Ok(response) => SaveOutcome {
                file_name: file.filename.clone(),
                success: true,
                response: Some(response),
                error: None,
            },
            Err(e) => {
                warn!(file = %file.filename, error = %e, "e-fact save failed");
                SaveOutcome {
                    file_name: file.filename.clone(),
                    success: false,
                    response: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
