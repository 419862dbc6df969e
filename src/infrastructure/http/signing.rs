//! HTTP adapter for the direct signing service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

use super::client::file_form;
use super::errors::from_status;
use crate::domain::models::{
    BatchSignResult, Config, FileHandle, SignResponseItem, SignedFile, TtnCredentials,
    ValidationResponse,
};
use crate::domain::ports::{ApiError, SigningApi};

/// HTTP client for the direct signing service
pub struct SigningClient {
    http_client: ReqwestClient,
    base_url: String,
}

impl SigningClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.signing_api.base_url, config.api.timeout_secs)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn xml_part(file_name: String, bytes: Vec<u8>) -> Result<Part, ApiError> {
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/xml")
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

async fn success_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(from_status(status, &body))
    }
}

/// The sign endpoint answers with a JSON array, a single JSON object, or
/// (for one file) the signed document itself.
fn parse_sign_body(body: &str, files: &[FileHandle]) -> Result<Vec<SignedFile>, ApiError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<SignResponseItem>(item)
                    .map(SignedFile::from)
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            })
            .collect(),
        Ok(item @ Value::Object(_)) => serde_json::from_value::<SignResponseItem>(item)
            .map(|item| vec![SignedFile::from(item)])
            .map_err(|e| ApiError::InvalidResponse(e.to_string())),
        Ok(_) | Err(_) => match files {
            [single] => Ok(vec![SignedFile {
                filename: single.name.clone(),
                success: !body.trim().is_empty(),
                signed_xml: body.to_string(),
                error: None,
            }]),
            _ => Err(ApiError::InvalidResponse(
                "expected a JSON array of results for a multi-file request".to_string(),
            )),
        },
    }
}

#[async_trait]
impl SigningApi for SigningClient {
    #[instrument(skip(self, files), fields(files = files.len()))]
    async fn sign(&self, files: &[FileHandle]) -> Result<Vec<SignedFile>, ApiError> {
        let form = file_form("files", files).await?;
        let response = self
            .http_client
            .post(self.url("api/signature/sign"))
            .multipart(form)
            .send()
            .await?;
        let body = success_body(response).await?;
        let signed = parse_sign_body(&body, files)?;

        // Older servers omit the original name; fall back to request order.
        Ok(signed
            .into_iter()
            .enumerate()
            .map(|(i, mut file)| {
                if file.filename.is_empty() {
                    if let Some(handle) = files.get(i) {
                        file.filename.clone_from(&handle.name);
                    }
                }
                file
            })
            .collect())
    }

    #[instrument(skip(self, signed_xml, credentials))]
    async fn save_efact(
        &self,
        file_name: &str,
        signed_xml: &str,
        credentials: &TtnCredentials,
    ) -> Result<Value, ApiError> {
        let form = Form::new()
            .part(
                "invoiceFile",
                xml_part(file_name.to_string(), signed_xml.as_bytes().to_vec())?,
            )
            .text("arg0", credentials.username.clone())
            .text("arg1", credentials.password.clone())
            .text("arg2", credentials.fiscal_id.clone());

        let response = self
            .http_client
            .post(self.url("api/efact/save"))
            .multipart(form)
            .send()
            .await?;
        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    async fn validate(&self, file_name: &str, xml: Vec<u8>) -> Result<ValidationResponse, ApiError> {
        let form = Form::new().part("file", xml_part(format!("signed-{file_name}"), xml)?);
        let response = self
            .http_client
            .post(self.url("api/validation/validate"))
            .multipart(form)
            .send()
            .await?;
        let body = success_body(response).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn create_package(&self, result: &BatchSignResult) -> Result<Option<String>, ApiError> {
        let payload = json!({
            "signedFiles": result.signed_files,
            "validationResults": result.validation_results,
            "ttnResults": result.ttn_results,
            "summary": result.summary,
        });
        let response = self
            .http_client
            .post(self.url("api/download/create-package"))
            .json(&payload)
            .send()
            .await?;
        let body = success_body(response).await?;
        let url = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("downloadUrl").and_then(Value::as_str).map(str::to_string))
            .filter(|u| !u.is_empty());
        debug!(has_url = url.is_some(), "package created");
        Ok(url)
    }
}
