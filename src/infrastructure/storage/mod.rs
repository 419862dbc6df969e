//! Local persistence under the storage directory (`.iconesign/` by default)

pub mod activity_log;
pub mod session_store;

pub use activity_log::JsonlActivityRepository;
pub use session_store::FileSessionStore;
