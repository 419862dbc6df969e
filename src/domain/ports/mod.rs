//! Port trait definitions
//!
//! Async interfaces the infrastructure adapters implement:
//! - WorkflowApi / AuthApi / TtnApi: the IconeSign backend
//! - SigningApi: the direct signing service
//! - SessionStore: persisted auth slice
//! - ActivityRepository: recorded user actions

pub mod activity_repository;
pub mod auth_api;
pub mod errors;
pub mod session_store;
pub mod signing_api;
pub mod ttn_api;
pub mod workflow_api;

pub use activity_repository::ActivityRepository;
pub use auth_api::{AuthApi, SignInGrant};
pub use errors::{ApiError, StorageError};
pub use session_store::SessionStore;
pub use signing_api::SigningApi;
pub use ttn_api::TtnApi;
pub use workflow_api::WorkflowApi;
