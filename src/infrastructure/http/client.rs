//! HTTP adapter for the workflow backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::errors::{error_message, from_status};
use super::retry::RetryPolicy;
use crate::domain::models::{
    CertificateInfo, Config, ConsultCriteria, ConsultRequest, ConsultResponse, FileHandle,
    ProcessResponse, ProgressSnapshot, User,
};
use crate::domain::ports::{ApiError, AuthApi, SignInGrant, TtnApi, WorkflowApi};

const XML_MIME: &str = "application/xml";

/// Configuration for the IconeSign HTTP client
#[derive(Debug, Clone)]
pub struct IconeSignClientConfig {
    /// Base URL including the API prefix, e.g. `http://host:8080/api/v1`
    pub base_url: String,
    pub timeout_secs: u64,
    pub retry_policy: RetryPolicy,
}

impl From<&Config> for IconeSignClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout_secs: config.api.timeout_secs,
            retry_policy: RetryPolicy::from(&config.retry),
        }
    }
}

/// `{success, message, data}` wrapper used by the auth endpoints.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// HTTP client for the IconeSign workflow backend
///
/// Idempotent reads (progress, profile, certificates, archives) go through
/// the retry policy. Batch submission, sign-in and TTN consult are sent once.
pub struct IconeSignClient {
    http_client: ReqwestClient,
    base_url: String,
    token: Option<String>,
    retry_policy: RetryPolicy,
}

impl IconeSignClient {
    pub fn new(config: IconeSignClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
            retry_policy: config.retry_policy,
        })
    }

    /// Attach the bearer token sent on protected calls.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Absolute URLs pass through; anything else resolves against the
    /// backend origin.
    fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        Url::parse(&self.base_url)
            .and_then(|base| base.join(url))
            .map_err(|e| ApiError::InvalidResponse(format!("bad download URL '{url}': {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let url = url.as_str();
        self.retry_policy
            .execute(|| async move {
                let response = self.authorize(self.http_client.get(url)).send().await?;
                read_json(response).await
            })
            .await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(from_status(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Build a multipart form with one `field` part per file.
pub(crate) async fn file_form(field: &'static str, files: &[FileHandle]) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for file in files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ApiError::FileRead {
                path: file.path.display().to_string(),
                message: e.to_string(),
            })?;
        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(file.content_type.as_deref().unwrap_or(XML_MIME))
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        form = form.part(field, part);
    }
    Ok(form)
}

/// Split the sign-in payload into token and profile.
fn parse_grant(data: Value) -> Result<SignInGrant, ApiError> {
    let Value::Object(mut fields) = data else {
        return Err(ApiError::InvalidResponse("sign-in data is not an object".to_string()));
    };
    let token = match fields.remove("token") {
        Some(Value::String(token)) if !token.is_empty() => token,
        _ => return Err(ApiError::InvalidResponse("sign-in response has no token".to_string())),
    };
    let user: User = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::InvalidResponse(format!("invalid user profile: {e}")))?;
    Ok(SignInGrant { token, user })
}

#[async_trait]
impl WorkflowApi for IconeSignClient {
    #[instrument(skip(self, files), fields(files = files.len()))]
    async fn process_invoices(&self, files: &[FileHandle]) -> Result<ProcessResponse, ApiError> {
        let form = file_form("files", files).await?;
        let response = self
            .authorize(self.http_client.post(self.url("workflow/process-invoices")))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn fetch_progress(&self, session_id: &str) -> Result<ProgressSnapshot, ApiError> {
        debug!(%session_id, "fetching progress");
        self.get_json(&format!("progress/{session_id}")).await
    }

    async fn download_archive(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = &self.resolve(url)?;
        self.retry_policy
            .execute(|| async move {
                let response = self
                    .authorize(self.http_client.get(url.clone()))
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(from_status(status, &body));
                }
                Ok(response.bytes().await?.to_vec())
            })
            .await
    }
}

#[async_trait]
impl AuthApi for IconeSignClient {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, username_or_email: &str, password: &str) -> Result<SignInGrant, ApiError> {
        let response = self
            .http_client
            .post(self.url("auth/signin"))
            .json(&json!({ "usernameOrEmail": username_or_email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Sign-in failed".to_string());
            return Err(match from_status(status, &body) {
                ApiError::Unauthorized(_) => ApiError::Unauthorized(message),
                ApiError::Rejected { status, .. } => ApiError::Rejected { status, message },
                other => other,
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        match envelope {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => parse_grant(data),
            Envelope { message, .. } => Err(ApiError::InvalidResponse(
                message.unwrap_or_else(|| "Invalid server response".to_string()),
            )),
        }
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        let url = self.url("auth/me");
        let url = url.as_str();
        let envelope: Envelope = self
            .retry_policy
            .execute(|| async move {
                let response = self.http_client.get(url).bearer_auth(token).send().await?;
                read_json(response).await
            })
            .await?;

        match envelope {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => serde_json::from_value(data)
                .map_err(|e| ApiError::InvalidResponse(format!("invalid user profile: {e}"))),
            _ => Err(ApiError::InvalidResponse("invalid user data".to_string())),
        }
    }
}

#[async_trait]
impl TtnApi for IconeSignClient {
    #[instrument(skip(self))]
    async fn consult(&self, criteria: &ConsultCriteria) -> Result<ConsultResponse, ApiError> {
        let request = ConsultRequest {
            criteria: criteria.clone(),
        };
        let response = self
            .authorize(self.http_client.post(self.url("ttn/consult")))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(from_status(status, &body));
        }

        // The body carries the outcome on both success and failure statuses.
        let mut parsed: ConsultResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(from_status(status, &body)),
            Err(e) => return Err(ApiError::InvalidResponse(e.to_string())),
        };
        if !status.is_success() {
            warn!(status = status.as_u16(), "TTN consult rejected");
            parsed.success = false;
            if parsed.error.is_none() {
                parsed.error = Some(error_message(status, ""));
            }
        }
        if !parsed.success && parsed.error.is_none() {
            parsed.error = Some("Consultation failed".to_string());
        }
        Ok(parsed)
    }

    async fn certificate_info(&self) -> Result<CertificateInfo, ApiError> {
        self.get_json("certificates/info").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IconeSignClient {
        IconeSignClient::new(IconeSignClientConfig {
            base_url: "http://localhost:8080/api/v1/".to_string(),
            timeout_secs: 5,
            retry_policy: RetryPolicy::none(),
        })
        .unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = client();
        assert_eq!(
            client.url("/progress/s-1"),
            "http://localhost:8080/api/v1/progress/s-1"
        );
    }

    #[test]
    fn test_resolve_download_urls() {
        let client = client();
        assert_eq!(
            client.resolve("https://cdn.example.tn/a.zip").unwrap().as_str(),
            "https://cdn.example.tn/a.zip"
        );
        assert_eq!(
            client.resolve("/download/s-1.zip").unwrap().as_str(),
            "http://localhost:8080/download/s-1.zip"
        );
    }

    #[test]
    fn test_parse_grant_splits_token() {
        let grant = parse_grant(json!({
            "token": "jwt-1",
            "id": 3,
            "username": "amira",
            "email": "amira@example.tn",
            "hasCredentials": true
        }))
        .unwrap();
        assert_eq!(grant.token, "jwt-1");
        assert_eq!(grant.user.username, "amira");
        assert!(grant.user.has_credentials);
    }

    #[test]
    fn test_parse_grant_requires_token() {
        let err = parse_grant(json!({"id": 3, "username": "a", "email": "a@b"})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
