//! In-memory marketplace storage for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::reputation::{
    domain::{Performer, PerformerStanding},
    ports::{PerformerRepository, PerformerRepositoryError, PerformerRepositoryResult},
};
use crate::task::{
    domain::{Category, Opinion, Task, TaskId, TaskStatus, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TransitionCommit},
};

/// Thread-safe in-memory store backing both the task and performer ports.
///
/// A single lock guards tasks, opinions, and performers so a transition
/// commit is checked and applied as one step.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketplace {
    state: Arc<RwLock<InMemoryMarketplaceState>>,
}

#[derive(Debug, Default)]
struct InMemoryMarketplaceState {
    tasks: HashMap<TaskId, Task>,
    opinions: HashMap<TaskId, Opinion>,
    performers: Vec<Performer>,
}

impl InMemoryMarketplace {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, InMemoryMarketplaceState>, std::io::Error> {
        self.state
            .read()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, InMemoryMarketplaceState>, std::io::Error> {
        self.state
            .write()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }
}

impl InMemoryMarketplaceState {
    fn performer_mut(&mut self, id: UserId) -> Option<&mut Performer> {
        self.performers.iter_mut().find(|performer| performer.id() == id)
    }

    fn is_registered(&self, id: UserId) -> bool {
        self.performers.iter().any(|performer| performer.id() == id)
    }

    /// Rejects a task whose assigned performer has no performer record.
    fn check_assignee(&self, task: &Task) -> TaskRepositoryResult<()> {
        match task.performer_id() {
            Some(performer_id) if !self.is_registered(performer_id) => {
                Err(TaskRepositoryError::PerformerNotFound(performer_id))
            }
            _ => Ok(()),
        }
    }

    fn validate_commit(&self, commit: &TransitionCommit) -> TaskRepositoryResult<()> {
        let task_id = commit.task.id();
        let stored = self
            .tasks
            .get(&task_id)
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        if stored.version() != commit.expected_version {
            return Err(TaskRepositoryError::VersionConflict {
                task_id,
                expected: commit.expected_version,
            });
        }
        self.check_assignee(&commit.task)?;
        if commit.opinion.is_some() && self.opinions.contains_key(&task_id) {
            return Err(TaskRepositoryError::DuplicateOpinion(task_id));
        }
        if let Some(increment) = commit
            .fail_count_increments
            .iter()
            .find(|increment| !self.is_registered(increment.performer_id))
        {
            return Err(TaskRepositoryError::PerformerNotFound(
                increment.performer_id,
            ));
        }
        Ok(())
    }

    fn standing_for(&self, performer: &Performer) -> PerformerStanding {
        let mut standing = PerformerStanding::empty(performer.id());
        standing.fail_count = performer.fail_count();
        for opinion in self
            .opinions
            .values()
            .filter(|opinion| opinion.performer_id() == performer.id())
        {
            standing.rate_sum = standing
                .rate_sum
                .saturating_add(u64::from(opinion.rate().value()));
            standing.opinion_count = standing.opinion_count.saturating_add(1);
        }
        standing
    }
}

/// Returns matching tasks newest first.
fn select_tasks(
    state: &InMemoryMarketplaceState,
    statuses: &[TaskStatus],
    keep: impl Fn(&Task) -> bool,
) -> Vec<Task> {
    let mut tasks: Vec<Task> = state
        .tasks
        .values()
        .filter(|task| keep(task) && statuses.contains(&task.status()))
        .cloned()
        .collect();
    tasks.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
    tasks
}

#[async_trait]
impl TaskRepository for InMemoryMarketplace {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write().map_err(TaskRepositoryError::persistence)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.check_assignee(task)?;
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read().map_err(TaskRepositoryError::persistence)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> TaskRepositoryResult<()> {
        let mut state = self.write().map_err(TaskRepositoryError::persistence)?;
        state.validate_commit(commit)?;

        // Validation passed, so none of the writes below can fail.
        for increment in &commit.fail_count_increments {
            if let Some(performer) = state.performer_mut(increment.performer_id) {
                performer.record_failures(increment.delta);
            }
        }
        if let Some(opinion) = &commit.opinion {
            state.opinions.insert(commit.task.id(), opinion.clone());
        }
        state.tasks.insert(commit.task.id(), commit.task.clone());
        Ok(())
    }

    async fn list_for_client(
        &self,
        client_id: UserId,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read().map_err(TaskRepositoryError::persistence)?;
        Ok(select_tasks(&state, statuses, |task| task.client_id() == client_id))
    }

    async fn list_for_performer(
        &self,
        performer_id: UserId,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read().map_err(TaskRepositoryError::persistence)?;
        Ok(select_tasks(&state, statuses, |task| {
            task.performer_id() == Some(performer_id)
        }))
    }

    async fn list_open(&self, category: Option<Category>) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read().map_err(TaskRepositoryError::persistence)?;
        Ok(select_tasks(&state, &[TaskStatus::New], |task| {
            category.as_ref().is_none_or(|wanted| task.category() == wanted)
        }))
    }

    async fn find_opinion_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Option<Opinion>> {
        let state = self.read().map_err(TaskRepositoryError::persistence)?;
        Ok(state.opinions.get(&task_id).cloned())
    }
}

#[async_trait]
impl PerformerRepository for InMemoryMarketplace {
    async fn register(&self, performer: &Performer) -> PerformerRepositoryResult<()> {
        let mut state = self.write().map_err(PerformerRepositoryError::persistence)?;
        if state.performer_mut(performer.id()).is_some() {
            return Err(PerformerRepositoryError::DuplicatePerformer(performer.id()));
        }
        state.performers.push(performer.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> PerformerRepositoryResult<Option<Performer>> {
        let state = self.read().map_err(PerformerRepositoryError::persistence)?;
        Ok(state
            .performers
            .iter()
            .find(|performer| performer.id() == id)
            .cloned())
    }

    async fn load_standings(&self) -> PerformerRepositoryResult<Vec<PerformerStanding>> {
        let state = self.read().map_err(PerformerRepositoryError::persistence)?;
        Ok(state
            .performers
            .iter()
            .map(|performer| state.standing_for(performer))
            .collect())
    }

    async fn find_opinions(&self, performer_id: UserId) -> PerformerRepositoryResult<Vec<Opinion>> {
        let state = self.read().map_err(PerformerRepositoryError::persistence)?;
        let mut opinions: Vec<Opinion> = state
            .opinions
            .values()
            .filter(|opinion| opinion.performer_id() == performer_id)
            .cloned()
            .collect();
        opinions.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(opinions)
    }
}
