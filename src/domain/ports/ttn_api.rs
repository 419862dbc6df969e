//! TTN lookup port.

use async_trait::async_trait;

use crate::domain::models::{CertificateInfo, ConsultCriteria, ConsultResponse};
use crate::domain::ports::errors::ApiError;

/// Port for TTN lookups and certificate setup
#[async_trait]
pub trait TtnApi: Send + Sync {
    async fn consult(&self, criteria: &ConsultCriteria) -> Result<ConsultResponse, ApiError>;

    async fn certificate_info(&self) -> Result<CertificateInfo, ApiError>;
}
