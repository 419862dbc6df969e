//! Authenticated user and access gating.

use serde::{Deserialize, Serialize};

/// Profile returned by the backend after sign-in or `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub role: String,
    /// Whether TTN and ANCE SEAL credentials are configured server-side.
    #[serde(default)]
    pub has_credentials: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// The persisted auth slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

impl AuthState {
    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
        }
    }
}

/// Outcome of checking whether protected workflow commands may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// No token: the user must sign in.
    SignInRequired,
    /// Signed in, but TTN / ANCE SEAL credentials are not configured.
    CredentialsMissing,
    Granted,
}

impl Access {
    pub fn evaluate(state: &AuthState) -> Self {
        if state.token.is_none() || !state.is_authenticated {
            return Self::SignInRequired;
        }
        match &state.user {
            Some(user) if !user.has_credentials => Self::CredentialsMissing,
            _ => Self::Granted,
        }
    }
}
