//! Shared world state for task workflow BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskforce::{
    reputation::services::ReputationService,
    task::{
        adapters::memory::InMemoryMarketplace,
        domain::{Actor, Task, TaskAction, UserId},
        services::{
            TaskLifecycleService, TaskWorkflowResult, TaskWorkflowService, TransitionOutcome,
        },
    },
};

/// Workflow service type used by the BDD world.
pub type TestWorkflow = TaskWorkflowService<InMemoryMarketplace, DefaultClock>;

/// Scenario world for task workflow behaviour tests.
pub struct TaskWorkflowWorld {
    pub workflow: TestWorkflow,
    pub lifecycle: TaskLifecycleService<InMemoryMarketplace, DefaultClock>,
    pub reputation: ReputationService<InMemoryMarketplace, DefaultClock>,
    pub client: UserId,
    pub performer: UserId,
    pub task: Option<Task>,
    pub last_transition_result: Option<TaskWorkflowResult<TransitionOutcome>>,
}

impl TaskWorkflowWorld {
    /// Creates a world with a fresh store and two participants.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryMarketplace::new());
        let clock = Arc::new(DefaultClock);

        Self {
            workflow: TaskWorkflowService::new(Arc::clone(&store), Arc::clone(&clock)),
            lifecycle: TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&clock)),
            reputation: ReputationService::new(store, clock),
            client: UserId::new(),
            performer: UserId::new(),
            task: None,
            last_transition_result: None,
        }
    }

    /// Actor for the scenario's client.
    #[must_use]
    pub const fn client_actor(&self) -> Actor {
        Actor::new(self.client)
    }

    /// Actor for the scenario's performer.
    #[must_use]
    pub const fn performer_actor(&self) -> Actor {
        Actor::new(self.performer)
    }

    /// Returns the scenario's task.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been posted yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Applies `action` as `actor` and records the result.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been posted yet.
    pub fn apply(&mut self, action: &dyn TaskAction, actor: Actor) -> Result<(), eyre::Report> {
        let task_id = self.task()?.id();
        let result = run_async(self.workflow.transition(task_id, action, actor));
        if let Ok(ref outcome) = result {
            self.task = Some(outcome.task.clone());
        }
        self.last_transition_result = Some(result);
        Ok(())
    }

    /// Reloads the scenario's task from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing or the lookup fails.
    pub fn reload_task(&self) -> Result<Task, eyre::Report> {
        let task_id = self.task()?.id();
        run_async(self.lifecycle.find_task(task_id))?
            .ok_or_else(|| eyre::eyre!("task {task_id} missing from store"))
    }
}

impl Default for TaskWorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskWorkflowWorld {
    TaskWorkflowWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
