//! TTN invoice lookup.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CertificateInfo, ConsultCriteria, ConsultResponse};
use crate::domain::ports::{SessionStore, TtnApi};

/// TTN invoice lookup and certificate setup info.
pub struct TtnService {
    api: Arc<dyn TtnApi>,
    session: Arc<dyn SessionStore>,
}

impl TtnService {
    pub fn new(api: Arc<dyn TtnApi>, session: Arc<dyn SessionStore>) -> Self {
        Self { api, session }
    }

    /// Search TTN. A stored token is required before anything is sent.
    pub async fn consult(&self, criteria: ConsultCriteria) -> DomainResult<ConsultResponse> {
        if self.session.load()?.token.is_none() {
            return Err(DomainError::SignInRequired);
        }
        let criteria = criteria.normalized();
        debug!(?criteria, "consulting TTN");
        Ok(self.api.consult(&criteria).await?)
    }

    /// Certificate setup, or the built-in defaults when the backend is
    /// unreachable.
    pub async fn certificate_info(&self) -> CertificateInfo {
        match self.api.certificate_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "certificate info unavailable, using defaults");
                CertificateInfo::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::AuthState;
    use crate::domain::ports::{ApiError, StorageError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSession(Option<&'static str>);

    impl SessionStore for FixedSession {
        fn load(&self) -> Result<AuthState, StorageError> {
            Ok(AuthState {
                token: self.0.map(str::to_string),
                is_authenticated: self.0.is_some(),
                user: None,
            })
        }

        fn save(&self, _: &AuthState) -> Result<(), StorageError> {
            Ok(())
        }

        fn clear(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubTtn {
        consults: AtomicUsize,
    }

    #[async_trait]
    impl TtnApi for StubTtn {
        async fn consult(&self, criteria: &ConsultCriteria) -> Result<ConsultResponse, ApiError> {
            self.consults.fetch_add(1, Ordering::SeqCst);
            assert!(criteria.status.is_none(), "blank criteria must be dropped");
            Ok(ConsultResponse {
                success: true,
                ..ConsultResponse::default()
            })
        }

        async fn certificate_info(&self) -> Result<CertificateInfo, ApiError> {
            Err(ApiError::Network("refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_consult_requires_token() {
        let api = Arc::new(StubTtn::default());
        let service = TtnService::new(api.clone(), Arc::new(FixedSession(None)));
        let err = service.consult(ConsultCriteria::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::SignInRequired));
        assert_eq!(api.consults.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_consult_normalizes_criteria() {
        let api = Arc::new(StubTtn::default());
        let service = TtnService::new(api.clone(), Arc::new(FixedSession(Some("tok"))));
        let criteria = ConsultCriteria {
            status: Some("   ".to_string()),
            ..ConsultCriteria::default()
        };
        assert!(service.consult(criteria).await.unwrap().success);
        assert_eq!(api.consults.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_certificate_info_falls_back() {
        let service = TtnService::new(Arc::new(StubTtn::default()), Arc::new(FixedSession(None)));
        assert_eq!(service.certificate_info().await, CertificateInfo::fallback());
    }
}
