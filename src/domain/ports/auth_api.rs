//! Authentication port.

use async_trait::async_trait;

use crate::domain::models::User;
use crate::domain::ports::errors::ApiError;

/// A successful sign-in: the bearer token and the profile it belongs to
#[derive(Debug, Clone)]
pub struct SignInGrant {
    pub token: String,
    pub user: User,
}

/// Port for the authentication endpoints
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in(&self, username_or_email: &str, password: &str) -> Result<SignInGrant, ApiError>;

    /// Resolve the profile behind a token
    async fn current_user(&self, token: &str) -> Result<User, ApiError>;
}
