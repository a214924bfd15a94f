//! Repository port for task persistence and atomic transition commits.

use crate::task::domain::{
    Category, FailCountIncrement, Opinion, Task, TaskId, TaskStatus, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Everything a single transition writes, committed all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCommit {
    /// Task state after the transition, carrying its new version.
    pub task: Task,
    /// Version the stored task must still have for the commit to apply.
    pub expected_version: u64,
    /// Opinion created by the transition, if any.
    pub opinion: Option<Opinion>,
    /// Performer fail-count increments caused by the transition.
    pub fail_count_increments: Vec<FailCountIncrement>,
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists and [`TaskRepositoryError::PerformerNotFound`] when the task is
    /// assigned to a user with no performer record.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Atomically persists a transition: the task row, the optional opinion,
    /// and every fail-count increment.
    ///
    /// Implementations must write nothing unless every part succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::VersionConflict`] when the stored task
    /// no longer has `expected_version`, [`TaskRepositoryError::NotFound`]
    /// when the task is missing, [`TaskRepositoryError::DuplicateOpinion`]
    /// when the task already has an opinion, and
    /// [`TaskRepositoryError::PerformerNotFound`] when the assigned performer
    /// or an incremented performer has no performer record.
    async fn commit_transition(&self, commit: &TransitionCommit) -> TaskRepositoryResult<()>;

    /// Returns tasks posted by `client_id` whose status is in `statuses`,
    /// newest first.
    async fn list_for_client(
        &self,
        client_id: UserId,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns tasks assigned to `performer_id` whose status is in
    /// `statuses`, newest first.
    async fn list_for_performer(
        &self,
        performer_id: UserId,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns tasks still open for offers (status `new`), newest first,
    /// optionally restricted to one category.
    async fn list_open(&self, category: Option<Category>) -> TaskRepositoryResult<Vec<Task>>;

    /// Finds the opinion attached to a task.
    async fn find_opinion_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Option<Opinion>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task already has an opinion.
    #[error("task {0} already has an opinion")]
    DuplicateOpinion(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A task was assigned to, or a fail-count increment targeted, a user
    /// with no performer record.
    #[error("performer not found: {0}")]
    PerformerNotFound(UserId),

    /// The task changed since it was read.
    #[error("task {task_id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        /// Task whose version moved.
        task_id: TaskId,
        /// Version the commit expected.
        expected: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
