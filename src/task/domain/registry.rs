//! Single source of truth for which actions may run from which status.

use super::{Task, TaskAction, TaskDomainError, TaskStatus};

/// Transition legality table consulted before any task mutation.
///
/// The registry only knows statuses: an action contributes its target
/// status and nothing else, so new action types never require changes here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRegistry;

impl StatusRegistry {
    /// Creates the registry.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns `true` iff the action's target status is adjacent to
    /// `current` in the transition graph.
    #[must_use]
    pub fn is_transition_allowed(self, current: TaskStatus, action: &dyn TaskAction) -> bool {
        current.can_transition_to(action.target_status())
    }

    /// Statuses directly reachable from `current`.
    #[must_use]
    pub fn next_statuses(self, current: TaskStatus) -> Vec<TaskStatus> {
        TaskStatus::ALL
            .into_iter()
            .filter(|candidate| current.can_transition_to(*candidate))
            .collect()
    }

    /// Checks that `action` may be applied to `task`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the task's status
    /// has no edge to the action's target.
    pub fn ensure_allowed(self, task: &Task, action: &dyn TaskAction) -> Result<(), TaskDomainError> {
        if self.is_transition_allowed(task.status(), action) {
            return Ok(());
        }
        Err(TaskDomainError::InvalidTransition {
            task_id: task.id(),
            from: task.status(),
            to: action.target_status(),
        })
    }
}
