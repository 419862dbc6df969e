//! Direct signing service port.

use async_trait::async_trait;

use crate::domain::models::{
    BatchSignResult, FileHandle, SignedFile, TtnCredentials, ValidationResponse,
};
use crate::domain::ports::errors::ApiError;

/// Port for the direct signing service
#[async_trait]
pub trait SigningApi: Send + Sync {
    /// Sign all files in one request; one result per file
    async fn sign(&self, files: &[FileHandle]) -> Result<Vec<SignedFile>, ApiError>;

    /// Push one signed invoice to TTN through the e-fact save endpoint
    async fn save_efact(
        &self,
        file_name: &str,
        signed_xml: &str,
        credentials: &TtnCredentials,
    ) -> Result<serde_json::Value, ApiError>;

    /// Check the signature of a signed document
    async fn validate(&self, file_name: &str, xml: Vec<u8>) -> Result<ValidationResponse, ApiError>;

    /// Ask the service to bundle a finished batch; returns a download URL
    async fn create_package(&self, result: &BatchSignResult) -> Result<Option<String>, ApiError>;
}
