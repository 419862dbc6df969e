//! Authentication and access gating.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Access, AuthState};
use crate::domain::ports::{ApiError, AuthApi, SessionStore};

/// Sign-in, session checks and the access gate in front of workflow commands.
pub struct AuthService {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>) -> Self {
        Self { api, store }
    }

    /// Exchange credentials for a token and persist the session.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, username_or_email: &str, password: &str) -> DomainResult<AuthState> {
        let grant = self
            .api
            .sign_in(username_or_email, password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized(msg) | ApiError::Rejected { message: msg, .. } => {
                    DomainError::SignInFailed(msg)
                }
                other => DomainError::Api(other),
            })?;

        let state = AuthState::authenticated(grant.user, grant.token);
        self.store.save(&state)?;
        info!(user = ?state.user.as_ref().map(|u| &u.username), "signed in");
        Ok(state)
    }

    /// Re-validate the stored token against the backend.
    ///
    /// Any failure clears the stored session and yields an unauthenticated
    /// state rather than an error.
    pub async fn check_auth(&self) -> DomainResult<AuthState> {
        let stored = self.store.load()?;
        let Some(token) = stored.token else {
            return Ok(AuthState::default());
        };

        match self.api.current_user(&token).await {
            Ok(user) => {
                let state = AuthState::authenticated(user, token);
                self.store.save(&state)?;
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, "stored session is no longer valid");
                self.store.clear()?;
                Ok(AuthState::default())
            }
        }
    }

    pub fn sign_out(&self) -> DomainResult<()> {
        self.store.clear()?;
        info!("signed out");
        Ok(())
    }

    /// Stored session without a network round-trip.
    pub fn current(&self) -> DomainResult<AuthState> {
        Ok(self.store.load()?)
    }

    pub async fn access(&self) -> DomainResult<(Access, AuthState)> {
        let state = self.check_auth().await?;
        Ok((Access::evaluate(&state), state))
    }

    /// Token for protected calls, or the reason access is refused.
    pub async fn require_access(&self) -> DomainResult<String> {
        let (access, state) = self.access().await?;
        match access {
            Access::SignInRequired => Err(DomainError::SignInRequired),
            Access::CredentialsMissing => Err(DomainError::CredentialsMissing),
            Access::Granted => state.token.ok_or(DomainError::SignInRequired),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::User;
    use crate::domain::ports::{SignInGrant, StorageError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        state: Mutex<AuthState>,
    }

    impl SessionStore for MemoryStore {
        fn load(&self) -> Result<AuthState, StorageError> {
            Ok(self.state.lock().unwrap().clone())
        }

        fn save(&self, state: &AuthState) -> Result<(), StorageError> {
            *self.state.lock().unwrap() = state.clone();
            Ok(())
        }

        fn clear(&self) -> Result<(), StorageError> {
            *self.state.lock().unwrap() = AuthState::default();
            Ok(())
        }
    }

    struct StubAuth {
        has_credentials: bool,
        token_valid: bool,
    }

    fn user(has_credentials: bool) -> User {
        User {
            id: 7,
            username: "amira".to_string(),
            email: "amira@example.tn".to_string(),
            first_name: "Amira".to_string(),
            last_name: "Ben Salah".to_string(),
            company_name: None,
            role: "USER".to_string(),
            has_credentials,
        }
    }

    #[async_trait]
    impl AuthApi for StubAuth {
        async fn sign_in(&self, login: &str, password: &str) -> Result<SignInGrant, ApiError> {
            if login == "amira" && password == "secret" {
                Ok(SignInGrant {
                    token: "tok-1".to_string(),
                    user: user(self.has_credentials),
                })
            } else {
                Err(ApiError::Unauthorized("Invalid credentials".to_string()))
            }
        }

        async fn current_user(&self, _token: &str) -> Result<User, ApiError> {
            if self.token_valid {
                Ok(user(self.has_credentials))
            } else {
                Err(ApiError::Unauthorized("expired".to_string()))
            }
        }
    }

    fn service(has_credentials: bool, token_valid: bool) -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let svc = AuthService::new(
            Arc::new(StubAuth {
                has_credentials,
                token_valid,
            }),
            store.clone(),
        );
        (svc, store)
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let (svc, store) = service(true, true);
        let state = svc.sign_in("amira", "secret").await.unwrap();
        assert!(state.is_authenticated);
        assert_eq!(store.load().unwrap().token.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_bad_credentials_map_to_sign_in_failed() {
        let (svc, store) = service(true, true);
        let err = svc.sign_in("amira", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::SignInFailed(ref m) if m == "Invalid credentials"));
        assert!(store.load().unwrap().token.is_none());
    }

    #[tokio::test]
    async fn test_invalid_token_clears_session() {
        let (svc, store) = service(true, false);
        store
            .save(&AuthState::authenticated(user(true), "old".to_string()))
            .unwrap();

        let state = svc.check_auth().await.unwrap();
        assert!(!state.is_authenticated);
        assert_eq!(store.load().unwrap(), AuthState::default());
    }

    #[tokio::test]
    async fn test_access_gate() {
        let (svc, _) = service(false, true);
        assert!(matches!(svc.require_access().await, Err(DomainError::SignInRequired)));

        svc.sign_in("amira", "secret").await.unwrap();
        assert!(matches!(svc.require_access().await, Err(DomainError::CredentialsMissing)));

        let (svc, _) = service(true, true);
        svc.sign_in("amira", "secret").await.unwrap();
        assert_eq!(svc.require_access().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let (svc, store) = service(true, true);
        svc.sign_in("amira", "secret").await.unwrap();
        svc.sign_out().unwrap();
        assert!(store.load().unwrap().token.is_none());
    }
}
