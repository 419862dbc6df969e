//! Application services built on the domain ports.

pub mod activity_service;
pub mod auth_service;
pub mod batch_sign;
pub mod file_intake;
pub mod progress_poller;
pub mod results;
pub mod sign_package;
pub mod ttn_service;
pub mod workflow_orchestrator;
pub mod workflow_store;

pub use activity_service::{ActivityService, HistoryView};
pub use auth_service::AuthService;
pub use batch_sign::BatchSignService;
pub use file_intake::{IntakeOutcome, IntakePolicy, Rejection};
pub use progress_poller::{PollOutcome, PollerConfig, PollerStatus, ProgressPoller, StopReason};
pub use results::ArchiveDownloader;
pub use ttn_service::TtnService;
pub use workflow_orchestrator::WorkflowOrchestrator;
pub use workflow_store::WorkflowStore;
