//! Task workflow engine: validates and commits status transitions.

use crate::config::WorkflowConfig;
use crate::task::{
    domain::{
        ActionRequest, Actor, Opinion, SideEffects, StatusRegistry, Task, TaskAction,
        TaskDomainError, TaskId, TaskStatus, TransitionContext,
    },
    ports::{TaskRepository, TaskRepositoryError, TransitionCommit},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for workflow transitions.
#[derive(Debug, Error)]
pub enum TaskWorkflowError {
    /// A domain rule rejected the transition.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// Concurrent writers kept winning until the retry budget ran out.
    #[error("task {task_id} kept changing concurrently after {attempts} attempts")]
    Conflict {
        /// Contended task.
        task_id: TaskId,
        /// Attempts made.
        attempts: u32,
    },
}

impl TaskWorkflowError {
    /// Returns `true` for failures that may succeed when retried unchanged.
    ///
    /// Only persistence failures qualify; every domain error is
    /// deterministic.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Repository(TaskRepositoryError::Persistence(_)))
    }

    /// Returns `true` when the task was already in the requested status.
    #[must_use]
    pub const fn is_already_in_target_state(&self) -> bool {
        matches!(
            self,
            Self::Domain(TaskDomainError::AlreadyInTargetState { .. })
        )
    }

    const fn is_version_conflict(&self) -> bool {
        matches!(
            self,
            Self::Repository(TaskRepositoryError::VersionConflict { .. })
        )
    }
}

/// Result type for workflow service operations.
pub type TaskWorkflowResult<T> = Result<T, TaskWorkflowError>;

/// Result of a committed transition, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// The task as committed.
    pub task: Task,
    /// Status the task left.
    pub previous_status: TaskStatus,
    /// Opinion created by the transition, if any.
    pub opinion: Option<Opinion>,
}

impl TransitionOutcome {
    /// Returns the status the task entered.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.task.status()
    }
}

/// Orchestrates transitions so that the status change and every side
/// effect commit together or not at all.
#[derive(Clone)]
pub struct TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    registry: StatusRegistry,
    config: WorkflowConfig,
}

impl<R, C> TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a workflow service with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            registry: StatusRegistry::new(),
            config: WorkflowConfig::default(),
        }
    }

    /// Replaces the service configuration.
    #[must_use]
    pub const fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the status registry the service consults.
    #[must_use]
    pub const fn registry(&self) -> StatusRegistry {
        self.registry
    }

    /// Applies `action` to the task on behalf of `actor`.
    ///
    /// Re-applying an action whose target status the task already has
    /// fails with [`TaskDomainError::AlreadyInTargetState`] and writes
    /// nothing, so at-least-once callers can retry freely. A commit that
    /// loses a race reloads the task and re-evaluates, which normally ends
    /// in that same signal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskWorkflowError::NotFound`] for unknown tasks,
    /// [`TaskWorkflowError::Domain`] when a workflow rule rejects the
    /// transition, [`TaskWorkflowError::Conflict`] when the retry budget is
    /// spent on concurrent modifications, and
    /// [`TaskWorkflowError::Repository`] when persistence keeps failing.
    pub async fn transition(
        &self,
        task_id: TaskId,
        action: &dyn TaskAction,
        actor: Actor,
    ) -> TaskWorkflowResult<TransitionOutcome> {
        let budget = self.config.retry.attempts();
        let mut attempt: u32 = 1;

        loop {
            let err = match self.attempt_transition(task_id, action, actor).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };

            if err.is_version_conflict() {
                if attempt >= budget {
                    tracing::warn!(
                        %task_id,
                        action = action.name(),
                        attempts = attempt,
                        "transition conflict retries exhausted"
                    );
                    return Err(TaskWorkflowError::Conflict {
                        task_id,
                        attempts: attempt,
                    });
                }
                tracing::debug!(
                    %task_id,
                    action = action.name(),
                    attempt,
                    "task changed concurrently, reloading"
                );
            } else if err.is_retryable() && attempt < budget {
                let delay = self.config.retry.backoff_for(attempt);
                tracing::warn!(
                    %task_id,
                    action = action.name(),
                    attempt,
                    error = %err,
                    delay = ?delay,
                    "transition failed on persistence, retrying"
                );
                tokio::time::sleep(delay).await;
            } else {
                return Err(err);
            }
            attempt = attempt.saturating_add(1);
        }
    }

    /// Builds a built-in action from a request payload and applies it.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`].
    pub async fn transition_request(
        &self,
        task_id: TaskId,
        request: ActionRequest,
        actor: Actor,
    ) -> TaskWorkflowResult<TransitionOutcome> {
        let action = request.into_action();
        self.transition(task_id, action.as_ref(), actor).await
    }

    async fn attempt_transition(
        &self,
        task_id: TaskId,
        action: &dyn TaskAction,
        actor: Actor,
    ) -> TaskWorkflowResult<TransitionOutcome> {
        let task = self
            .repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskWorkflowError::NotFound(task_id))?;
        let target = action.target_status();

        if task.status() == target {
            tracing::debug!(
                %task_id,
                action = action.name(),
                status = %target,
                "task already in target status"
            );
            return Err(TaskDomainError::AlreadyInTargetState {
                task_id,
                status: target,
            }
            .into());
        }
        self.registry.ensure_allowed(&task, action)?;

        let context = TransitionContext::new(actor, self.clock.utc());
        action.authorize(&task, &context)?;

        let mut updated = task.clone();
        let mut effects = SideEffects::new();
        action.apply_side_effects(&mut updated, &context, &mut effects)?;
        updated.set_status(target, context.now())?;
        updated.bump_version();

        let (opinion, fail_count_increments) = effects.into_parts();
        let commit = TransitionCommit {
            task: updated,
            expected_version: task.version(),
            opinion,
            fail_count_increments,
        };
        self.repository.commit_transition(&commit).await?;

        tracing::info!(
            %task_id,
            action = action.name(),
            from = %task.status(),
            to = %target,
            version = commit.task.version(),
            "task transition committed"
        );

        Ok(TransitionOutcome {
            task: commit.task,
            previous_status: task.status(),
            opinion: commit.opinion,
        })
    }
}
