//! Activity journal port.

use async_trait::async_trait;

use crate::domain::models::ActivityRecord;
use crate::domain::ports::errors::StorageError;

/// Repository port for recorded user actions
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn record(&self, record: &ActivityRecord) -> Result<(), StorageError>;

    /// Most recent records, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, StorageError>;
}
