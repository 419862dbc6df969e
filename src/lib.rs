//! IconeSign - invoice e-signature client
//!
//! Drives batches of XML invoices through the IconeSign backend: intake,
//! submission, progress polling, results. Also covers direct signing and
//! validation, TTN lookups and a local activity history.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, the workflow reducer, errors, ports
//! - **Service Layer** (`services`): orchestrator, poller, auth, pipelines
//! - **Infrastructure Layer** (`infrastructure`): config, logging, HTTP, storage
//! - **CLI Layer** (`cli`): command-line interface

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, FileHandle, FileStage, FileStatus, Phase, ProgressSnapshot, WorkflowEvent,
    WorkflowFile, WorkflowResults, WorkflowState,
};
pub use domain::ports::{ApiError, AuthApi, SigningApi, TtnApi, WorkflowApi};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ProgressPoller, WorkflowOrchestrator, WorkflowStore};
