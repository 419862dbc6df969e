//! Domain errors for the IconeSign client.

use thiserror::Error;

use crate::domain::ports::errors::{ApiError, StorageError};

/// Domain-level errors that can occur while driving a workflow.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No files to process")]
    NoFiles,

    #[error("A batch is already being processed")]
    BatchInProgress,

    #[error("No session identifier: submit a batch before polling")]
    MissingSessionId,

    #[error("Not signed in. Run 'iconesign auth signin' first.")]
    SignInRequired,

    #[error("TTN and ANCE SEAL credentials are not configured for this account. Contact your administrator.")]
    CredentialsMissing,

    #[error("Sign-in failed: {0}")]
    SignInFailed(String),

    #[error("TTN credentials are not configured (ttn.username, ttn.password, ttn.fiscal_id)")]
    TtnCredentialsMissing,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result alias used across the services.
pub type DomainResult<T> = Result<T, DomainError>;
