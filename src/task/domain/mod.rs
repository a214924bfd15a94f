//! Domain model for the task workflow.
//!
//! Tasks move through a fixed status graph owned by [`StatusRegistry`].
//! Each move is requested through a [`TaskAction`], which contributes the
//! target status and its side effects; the registry never needs to know
//! which actions exist.

mod action;
mod error;
mod ids;
mod opinion;
mod registry;
mod status;
mod task;

pub use action::{
    ActionRequest, Actor, CancelAction, CompleteAction, DenyAction, FailAction,
    FailCountIncrement, SideEffects, StartAction, TaskAction, TransitionContext,
};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{Category, OpinionId, TaskId, UserId};
pub use opinion::{Opinion, OpinionDraft, PersistedOpinionData, Rate};
pub use registry::StatusRegistry;
pub use status::TaskStatus;
pub use task::{INITIAL_TASK_VERSION, NewTaskData, PersistedTaskData, Task};
