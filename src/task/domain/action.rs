//! Transition requests and the side effects each one carries.
//!
//! An action names the status it moves a task to and mutates a working copy
//! of the task plus a [`SideEffects`] accumulator. Nothing an action does is
//! visible until the workflow service commits the copy and the accumulated
//! effects together, so a failing action leaves no trace.

use super::{Opinion, OpinionDraft, Task, TaskDomainError, TaskStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User on whose behalf a transition runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
}

impl Actor {
    /// Creates an actor for the given user.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(self) -> UserId {
        self.user_id
    }
}

/// Explicit per-request context handed to actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionContext {
    actor: Actor,
    now: DateTime<Utc>,
}

impl TransitionContext {
    /// Creates a context for `actor` observed at `now`.
    #[must_use]
    pub const fn new(actor: Actor, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.actor
    }

    /// Returns the request timestamp.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Fail-count increment recorded for a performer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailCountIncrement {
    /// Performer whose counter grows.
    pub performer_id: UserId,
    /// Amount added to the counter.
    pub delta: u32,
}

/// Writes an action wants committed alongside the task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideEffects {
    opinion: Option<Opinion>,
    fail_count_increments: Vec<FailCountIncrement>,
}

impl SideEffects {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the opinion to persist with the transition.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Validation`] if an opinion was already
    /// recorded for this transition.
    pub fn attach_opinion(&mut self, opinion: Opinion) -> Result<(), TaskDomainError> {
        if self.opinion.is_some() {
            return Err(TaskDomainError::Validation(
                "a task accepts a single opinion".to_owned(),
            ));
        }
        self.opinion = Some(opinion);
        Ok(())
    }

    /// Records a fail-count increment for `performer_id`.
    pub fn increment_fail_count(&mut self, performer_id: UserId, delta: u32) {
        self.fail_count_increments.push(FailCountIncrement {
            performer_id,
            delta,
        });
    }

    /// Returns the recorded opinion, if any.
    #[must_use]
    pub const fn opinion(&self) -> Option<&Opinion> {
        self.opinion.as_ref()
    }

    /// Returns the recorded fail-count increments.
    #[must_use]
    pub fn fail_count_increments(&self) -> &[FailCountIncrement] {
        &self.fail_count_increments
    }

    /// Splits the accumulator into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Option<Opinion>, Vec<FailCountIncrement>) {
        (self.opinion, self.fail_count_increments)
    }
}

/// A named transition request with associated side effects.
///
/// Implement this trait to add an action; the status registry and workflow
/// service work with any implementation.
pub trait TaskAction: fmt::Debug + Send + Sync {
    /// Short action name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Status the task ends in when the action commits.
    fn target_status(&self) -> TaskStatus;

    /// Checks that `context`'s actor may run this action on `task`.
    ///
    /// The default admits only the task's client.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Forbidden`] for any other user.
    fn authorize(&self, task: &Task, context: &TransitionContext) -> Result<(), TaskDomainError> {
        ensure_actor(task, context, task.client_id(), self.name())
    }

    /// Applies the action's effects to a working copy of the task.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskDomainError`] when the action's preconditions are not
    /// met; the transition is then abandoned.
    fn apply_side_effects(
        &self,
        task: &mut Task,
        context: &TransitionContext,
        effects: &mut SideEffects,
    ) -> Result<(), TaskDomainError>;
}

fn ensure_actor(
    task: &Task,
    context: &TransitionContext,
    allowed: UserId,
    action: &'static str,
) -> Result<(), TaskDomainError> {
    let user_id = context.actor().user_id();
    if user_id == allowed {
        return Ok(());
    }
    Err(TaskDomainError::Forbidden {
        task_id: task.id(),
        user_id,
        action,
    })
}

/// Client assigns a performer and work begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartAction {
    performer_id: UserId,
}

impl StartAction {
    /// Creates a start action assigning `performer_id`.
    #[must_use]
    pub const fn new(performer_id: UserId) -> Self {
        Self { performer_id }
    }
}

impl TaskAction for StartAction {
    fn name(&self) -> &'static str {
        "start"
    }

    fn target_status(&self) -> TaskStatus {
        TaskStatus::InProgress
    }

    fn apply_side_effects(
        &self,
        task: &mut Task,
        _context: &TransitionContext,
        _effects: &mut SideEffects,
    ) -> Result<(), TaskDomainError> {
        task.assign_performer(self.performer_id)
    }
}

/// Client accepts the work and rates the performer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteAction {
    opinion: Option<OpinionDraft>,
}

impl CompleteAction {
    /// Creates a completion carrying the client's opinion.
    #[must_use]
    pub const fn new(opinion: OpinionDraft) -> Self {
        Self {
            opinion: Some(opinion),
        }
    }

    /// Creates a completion with no opinion; it always fails validation.
    #[must_use]
    pub const fn without_opinion() -> Self {
        Self { opinion: None }
    }
}

impl TaskAction for CompleteAction {
    fn name(&self) -> &'static str {
        "complete"
    }

    fn target_status(&self) -> TaskStatus {
        TaskStatus::Complete
    }

    fn apply_side_effects(
        &self,
        task: &mut Task,
        context: &TransitionContext,
        effects: &mut SideEffects,
    ) -> Result<(), TaskDomainError> {
        let draft = self.opinion.as_ref().ok_or_else(|| {
            TaskDomainError::Validation("completing a task requires an opinion".to_owned())
        })?;
        let performer_id = task.performer_id().ok_or_else(|| {
            TaskDomainError::Validation(format!(
                "task {} has no performer to receive the opinion",
                task.id()
            ))
        })?;
        effects.attach_opinion(Opinion::from_draft(
            task.id(),
            performer_id,
            draft,
            context.now(),
        ))
    }
}

/// Client cancels the task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelAction;

impl TaskAction for CancelAction {
    fn name(&self) -> &'static str {
        "cancel"
    }

    fn target_status(&self) -> TaskStatus {
        TaskStatus::Cancel
    }

    fn apply_side_effects(
        &self,
        _task: &mut Task,
        _context: &TransitionContext,
        _effects: &mut SideEffects,
    ) -> Result<(), TaskDomainError> {
        Ok(())
    }
}

/// Assigned performer refuses the task, counting as a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DenyAction;

impl TaskAction for DenyAction {
    fn name(&self) -> &'static str {
        "deny"
    }

    fn target_status(&self) -> TaskStatus {
        TaskStatus::Deny
    }

    fn authorize(&self, task: &Task, context: &TransitionContext) -> Result<(), TaskDomainError> {
        let performer_id = task
            .performer_id()
            .ok_or(TaskDomainError::NoPerformerAssigned(task.id()))?;
        ensure_actor(task, context, performer_id, self.name())
    }

    fn apply_side_effects(
        &self,
        task: &mut Task,
        _context: &TransitionContext,
        effects: &mut SideEffects,
    ) -> Result<(), TaskDomainError> {
        let performer_id = task
            .performer_id()
            .ok_or(TaskDomainError::NoPerformerAssigned(task.id()))?;
        effects.increment_fail_count(performer_id, 1);
        Ok(())
    }
}

/// Client marks the task as failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailAction;

impl TaskAction for FailAction {
    fn name(&self) -> &'static str {
        "fail"
    }

    fn target_status(&self) -> TaskStatus {
        TaskStatus::Fail
    }

    fn apply_side_effects(
        &self,
        _task: &mut Task,
        _context: &TransitionContext,
        _effects: &mut SideEffects,
    ) -> Result<(), TaskDomainError> {
        Ok(())
    }
}

/// Serializable form of the built-in actions, as posted by a web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    /// Assign a performer and start work.
    Start {
        /// Performer to assign.
        performer_id: UserId,
    },
    /// Accept the work with an opinion.
    Complete {
        /// Opinion left for the performer.
        opinion: Option<OpinionDraft>,
    },
    /// Cancel the task.
    Cancel,
    /// Refuse the task as its performer.
    Deny,
    /// Mark the task failed.
    Fail,
}

impl ActionRequest {
    /// Builds the action this request describes.
    #[must_use]
    pub fn into_action(self) -> Box<dyn TaskAction> {
        match self {
            Self::Start { performer_id } => Box::new(StartAction::new(performer_id)),
            Self::Complete { opinion } => Box::new(CompleteAction { opinion }),
            Self::Cancel => Box::new(CancelAction),
            Self::Deny => Box::new(DenyAction),
            Self::Fail => Box::new(FailAction),
        }
    }
}
