//! Types for the direct sign / save / validate pipeline.

use serde::{Deserialize, Serialize};

/// One item of the signing endpoint's JSON answer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignResponseItem {
    pub success: bool,
    pub signed_xml: Option<String>,
    pub original_file_name: Option<String>,
    pub error: Option<String>,
}

/// Outcome of signing a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedFile {
    /// Name of the submitted file
    pub filename: String,
    /// Whether the service reported success
    pub success: bool,
    /// Signed document, empty when signing failed
    pub signed_xml: String,
    pub error: Option<String>,
}

impl From<SignResponseItem> for SignedFile {
    fn from(item: SignResponseItem) -> Self {
        Self {
            filename: item.original_file_name.unwrap_or_default(),
            success: item.success,
            signed_xml: item.signed_xml.unwrap_or_default(),
            error: item.error,
        }
    }
}

impl SignedFile {
    /// Signed and carrying a document.
    pub fn is_usable(&self) -> bool {
        self.success && !self.signed_xml.is_empty()
    }
}

/// Raw body of the validation endpoint. Older servers name the report
/// `validationReport`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationResponse {
    pub valid: bool,
    pub report: Option<String>,
    pub validation_report: Option<String>,
    pub error: Option<String>,
}

/// Validation verdict for one signed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub file_name: String,
    pub is_valid: bool,
    /// Raw report text returned by the service
    pub report: Option<String>,
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn from_response(file_name: impl Into<String>, response: ValidationResponse) -> Self {
        Self {
            file_name: file_name.into(),
            is_valid: response.valid,
            report: response.report.or(response.validation_report),
            error: response.error,
        }
    }

    /// Outcome for a file whose validation call itself failed.
    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            is_valid: false,
            report: None,
            error: Some(error.into()),
        }
    }
}

/// Result of pushing one signed invoice to the e-fact save endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub file_name: String,
    pub success: bool,
    pub response: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Per-step counts of a batch-sign run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub signed: usize,
    pub saved: usize,
    pub validated: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// A file only counts as processed once it cleared every step, so the
    /// failure count follows the weakest step.
    pub fn compute(total: usize, signed: usize, saved: usize, validated: usize) -> Self {
        let cleared = signed.min(saved).min(validated);
        Self {
            total,
            signed,
            saved,
            validated,
            failed: total.saturating_sub(cleared),
        }
    }
}

/// Everything a batch-sign run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSignResult {
    pub signed_files: Vec<SignedFile>,
    pub validation_results: Vec<ValidationOutcome>,
    pub ttn_results: Vec<SaveOutcome>,
    /// Server-side package link, when the service offers one
    pub download_url: Option<String>,
    pub summary: BatchSummary,
}
