//! Activity tracking and the history view.
//!
//! Tracking is fire-and-forget from the caller's point of view: a failure
//! to record an action is logged and never interrupts the workflow that
//! produced it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{ActivityFilter, ActivityRecord, ActivitySummary};
use crate::domain::ports::ActivityRepository;

/// How many rows the history view loads before filtering.
pub const HISTORY_FETCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub summary: ActivitySummary,
    pub records: Vec<ActivityRecord>,
    /// Rows loaded before the filter was applied.
    pub loaded: usize,
}

/// Records user actions and serves the filtered history.
pub struct ActivityService {
    repository: Arc<dyn ActivityRepository>,
}

impl ActivityService {
    pub fn new(repository: Arc<dyn ActivityRepository>) -> Self {
        Self { repository }
    }

    pub async fn track(&self, record: ActivityRecord) {
        let action = record.action.clone();
        match self.repository.record(&record).await {
            Ok(()) => debug!(%action, kind = %record.kind, "activity recorded"),
            Err(e) => warn!(%action, error = %e, "failed to record activity"),
        }
    }

    /// Load recent rows, summarize them, then filter locally.
    pub async fn history(&self, filter: &ActivityFilter, limit: usize) -> DomainResult<HistoryView> {
        let loaded = self.repository.recent(HISTORY_FETCH_LIMIT.max(limit)).await?;
        let summary = ActivitySummary::from_records(&loaded);
        let records = filter
            .apply(&loaded, Utc::now())
            .into_iter()
            .take(limit)
            .cloned()
            .collect();

        Ok(HistoryView {
            summary,
            records,
            loaded: loaded.len(),
        })
    }
}
