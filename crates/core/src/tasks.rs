//! In-process status tracking for submitted research tasks.
//!
//! Each task has exactly one writer, the background job that runs it; request handlers only
//! read. Entries live in a sharded concurrent map so unrelated tasks never contend on a
//! single lock. State is lost on restart; completed work survives in the report store.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use research_uuid::ResearchId;
use serde::Serialize;
use std::sync::Arc;

/// Lifecycle of a research task.
///
/// `InProgress -> Processing -> Completed | Failed`. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    InProgress,
    Processing,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::InProgress => "in_progress",
            TaskState::Processing => "processing",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }

    fn can_become(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::InProgress, TaskState::Processing)
                | (TaskState::InProgress, TaskState::Failed)
                | (TaskState::Processing, TaskState::Completed)
                | (TaskState::Processing, TaskState::Failed)
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    pub owner_id: String,
    pub topic: String,
    pub state: TaskState,
    /// Cause of failure, present only in the `Failed` state.
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskStoreError {
    #[error("research task {0} is already registered")]
    AlreadyRegistered(ResearchId),
    #[error("research task {0} is not registered")]
    Unknown(ResearchId),
    #[error("research task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ResearchId,
        from: TaskState,
        to: TaskState,
    },
}

/// Process-wide task status map. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct TaskStatusStore {
    entries: Arc<DashMap<ResearchId, TaskStatus>>,
}

impl TaskStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new task in the `InProgress` state.
    ///
    /// # Errors
    ///
    /// Returns `TaskStoreError::AlreadyRegistered` if `id` is already tracked.
    pub fn register(
        &self,
        id: ResearchId,
        owner_id: &str,
        topic: &str,
    ) -> Result<(), TaskStoreError> {
        let now = Utc::now();
        match self.entries.entry(id) {
            Entry::Occupied(_) => Err(TaskStoreError::AlreadyRegistered(id)),
            Entry::Vacant(slot) => {
                slot.insert(TaskStatus {
                    owner_id: owner_id.to_string(),
                    topic: topic.to_string(),
                    state: TaskState::InProgress,
                    error: None,
                    submitted_at: now,
                    updated_at: now,
                });
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &ResearchId) -> Option<TaskStatus> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    pub fn mark_processing(&self, id: &ResearchId) -> Result<(), TaskStoreError> {
        self.transition(id, TaskState::Processing, None)
    }

    pub fn mark_completed(&self, id: &ResearchId) -> Result<(), TaskStoreError> {
        self.transition(id, TaskState::Completed, None)
    }

    pub fn mark_failed(
        &self,
        id: &ResearchId,
        cause: impl Into<String>,
    ) -> Result<(), TaskStoreError> {
        self.transition(id, TaskState::Failed, Some(cause.into()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn transition(
        &self,
        id: &ResearchId,
        to: TaskState,
        error: Option<String>,
    ) -> Result<(), TaskStoreError> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or(TaskStoreError::Unknown(*id))?;
        let from = entry.state;
        if !from.can_become(to) {
            return Err(TaskStoreError::InvalidTransition { id: *id, from, to });
        }
        entry.state = to;
        entry.error = error;
        entry.updated_at = Utc::now();
        tracing::debug!("research task {} moved from {} to {}", id, from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let store = TaskStatusStore::new();
        let id = ResearchId::new();
        store.register(id, "owner", "topic").unwrap();
        assert_eq!(store.get(&id).unwrap().state, TaskState::InProgress);

        store.mark_processing(&id).unwrap();
        assert_eq!(store.get(&id).unwrap().state, TaskState::Processing);

        store.mark_completed(&id).unwrap();
        let status = store.get(&id).unwrap();
        assert_eq!(status.state, TaskState::Completed);
        assert_eq!(status.error, None);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let store = TaskStatusStore::new();
        let id = ResearchId::new();
        store.register(id, "owner", "topic").unwrap();
        store.mark_processing(&id).unwrap();
        store.mark_failed(&id, "model timed out").unwrap();

        assert_eq!(
            store.mark_completed(&id),
            Err(TaskStoreError::InvalidTransition {
                id,
                from: TaskState::Failed,
                to: TaskState::Completed,
            })
        );
        let status = store.get(&id).unwrap();
        assert_eq!(status.state, TaskState::Failed);
        assert_eq!(status.error.as_deref(), Some("model timed out"));
    }

    #[test]
    fn test_cannot_skip_processing_to_complete() {
        let store = TaskStatusStore::new();
        let id = ResearchId::new();
        store.register(id, "owner", "topic").unwrap();
        assert!(store.mark_completed(&id).is_err());
        assert!(store.mark_failed(&id, "early").is_ok());
    }

    #[test]
    fn test_duplicate_and_unknown_ids() {
        let store = TaskStatusStore::new();
        let id = ResearchId::new();
        store.register(id, "owner", "topic").unwrap();
        assert_eq!(
            store.register(id, "other", "topic"),
            Err(TaskStoreError::AlreadyRegistered(id))
        );
        let missing = ResearchId::new();
        assert_eq!(
            store.mark_processing(&missing),
            Err(TaskStoreError::Unknown(missing))
        );
        assert!(store.get(&missing).is_none());
    }

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskState::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(TaskState::Processing.to_string(), "processing");
    }

    #[test]
    fn test_concurrent_tasks_are_independent() {
        let store = TaskStatusStore::new();
        let ids: Vec<ResearchId> = (0..32).map(|_| ResearchId::new()).collect();
        std::thread::scope(|scope| {
            for id in &ids {
                let store = store.clone();
                scope.spawn(move || {
                    store.register(*id, "owner", "topic").unwrap();
                    store.mark_processing(id).unwrap();
                    store.mark_completed(id).unwrap();
                });
            }
        });
        assert_eq!(store.len(), 32);
        assert!(ids
            .iter()
            .all(|id| store.get(id).unwrap().state == TaskState::Completed));
    }
}
