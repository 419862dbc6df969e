//! Domain models for the IconeSign client.

pub mod activity;
pub mod auth;
pub mod certificate;
pub mod config;
pub mod file;
pub mod progress;
pub mod signing;
pub mod stage;
pub mod ttn;
pub mod workflow;

pub use activity::{
    action_label, ActivityFilter, ActivityKind, ActivityRecord, ActivitySummary, DateWindow,
};
pub use auth::{Access, AuthState, User};
pub use certificate::CertificateInfo;
pub use config::{
    ApiConfig, Config, IntakeConfig, LoggingConfig, PollingConfig, RetryConfig, SigningApiConfig,
    StorageConfig, TtnCredentials,
};
pub use file::{FileHandle, FileStage, FileStatus, WorkflowFile};
pub use progress::{BatchStatus, FileProgress, ProcessResponse, ProgressSnapshot};
pub use signing::{
    BatchSignResult, BatchSummary, SaveOutcome, SignResponseItem, SignedFile, ValidationOutcome,
    ValidationResponse,
};
pub use stage::{PipelineStage, StageStatus};
pub use ttn::{ConsultCriteria, ConsultRequest, ConsultResponse, Invoice};
pub use workflow::{Phase, WorkflowEvent, WorkflowResults, WorkflowState};
