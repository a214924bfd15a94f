//! Error types for task domain validation and workflow rules.

use super::{TaskId, TaskStatus, UserId};
use thiserror::Error;

/// Errors returned while constructing or transitioning domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task category is empty after trimming.
    #[error("task category must not be empty")]
    EmptyCategory,

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The opinion rate is outside the accepted range.
    #[error("invalid opinion rate {0}, expected a value between 1 and 5")]
    InvalidRate(u8),

    /// The requested status change is not an edge of the transition graph.
    #[error("invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        /// Task that rejected the transition.
        task_id: TaskId,
        /// Status before the attempted transition.
        from: TaskStatus,
        /// Requested target status.
        to: TaskStatus,
    },

    /// Preconditions of an action's side effects were not met.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The action needs an assigned performer but the task has none.
    #[error("task {0} has no performer assigned")]
    NoPerformerAssigned(TaskId),

    /// The task already reached the action's target status.
    #[error("task {task_id} is already {status}")]
    AlreadyInTargetState {
        /// Task that is already in the target status.
        task_id: TaskId,
        /// The status the task is in.
        status: TaskStatus,
    },

    /// The acting user may not perform the action on this task.
    #[error("user {user_id} may not {action} task {task_id}")]
    Forbidden {
        /// Task the action targeted.
        task_id: TaskId,
        /// User who attempted the action.
        user_id: UserId,
        /// Name of the rejected action.
        action: &'static str,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
