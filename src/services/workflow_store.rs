//! Shared holder of the one [`WorkflowState`] of a session.
//!
//! Every mutation goes through [`WorkflowStore::dispatch`], which folds the
//! event through the reducer while holding the channel's write lock. Readers
//! either take a cloned snapshot or subscribe for change notifications.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::models::{Phase, WorkflowEvent, WorkflowState};

/// Single owner of the workflow state. Clones share the same state.
#[derive(Clone)]
pub struct WorkflowStore {
    tx: Arc<watch::Sender<WorkflowState>>,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorkflowState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Apply an event and return the resulting state.
    pub fn dispatch(&self, event: WorkflowEvent) -> WorkflowState {
        self.transition(event).1
    }

    /// Apply an event and return the phase it was applied in together with
    /// the resulting state. Both are read under the same write lock, so a
    /// caller can tell whether its own event caused a phase change.
    pub fn transition(&self, event: WorkflowEvent) -> (Phase, WorkflowState) {
        let mut before = Phase::Idle;
        let mut after = WorkflowState::default();
        self.tx.send_modify(|state| {
            before = state.phase;
            let current = std::mem::take(state);
            *state = current.reduce(event);
            after = state.clone();
        });
        (before, after)
    }

    pub fn snapshot(&self) -> WorkflowState {
        self.tx.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.tx.borrow().phase
    }

    pub fn session_id(&self) -> Option<String> {
        self.tx.borrow().session_id.clone()
    }

    /// Receiver that wakes on every dispatched event.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.tx.subscribe()
    }
}
