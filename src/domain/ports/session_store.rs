//! Session persistence port.

use crate::domain::models::AuthState;
use crate::domain::ports::errors::StorageError;

/// Durable storage for the bearer token and auth slice
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<AuthState, StorageError>;

    fn save(&self, state: &AuthState) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}
