//! Application services for the task workflow.

mod lifecycle;
mod workflow;

pub use lifecycle::{
    CreateTaskRequest, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
    TaskListFilter, UserRole,
};
pub use workflow::{
    TaskWorkflowError, TaskWorkflowResult, TaskWorkflowService, TransitionOutcome,
};
