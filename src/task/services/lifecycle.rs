//! Service layer for posting tasks and querying them per user.

use crate::reputation::domain::Performer;
use crate::task::{
    domain::{Category, NewTaskData, Opinion, Task, TaskDomainError, TaskId, TaskStatus, UserId},
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Request payload for posting a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    client_id: UserId,
    category: String,
    title: String,
    description: Option<String>,
    expire_at: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// Creates a request with required task fields.
    #[must_use]
    pub fn new(client_id: UserId, category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            client_id,
            category: category.into(),
            title: title.into(),
            description: None,
            expire_at: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the task deadline.
    #[must_use]
    pub const fn with_expire_at(mut self, expire_at: DateTime<Utc>) -> Self {
        self.expire_at = Some(expire_at);
        self
    }
}

/// Which side of a task a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// The user posts tasks.
    Client,
    /// The user performs tasks.
    Contractor,
}

/// "My tasks" listing buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskListFilter {
    /// Tasks awaiting a performer.
    New,
    /// Tasks in any terminal status.
    Closed,
    /// Tasks being worked on.
    InProgress,
    /// Tasks being worked on past their deadline.
    Expired,
}

impl TaskListFilter {
    /// Statuses the filter selects before any deadline check.
    #[must_use]
    pub const fn statuses(self) -> &'static [TaskStatus] {
        match self {
            Self::New => &[TaskStatus::New],
            Self::Closed => &[
                TaskStatus::Complete,
                TaskStatus::Fail,
                TaskStatus::Cancel,
                TaskStatus::Deny,
            ],
            Self::InProgress | Self::Expired => &[TaskStatus::InProgress],
        }
    }
}

impl TryFrom<&str> for TaskListFilter {
    type Error = TaskLifecycleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "close" | "closed" => Ok(Self::Closed),
            "in_progress" => Ok(Self::InProgress),
            "expired" => Ok(Self::Expired),
            _ => Err(TaskLifecycleError::InvalidFilter(value.to_owned())),
        }
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The listing filter name is unknown.
    #[error("unknown task filter: {0}")]
    InvalidFilter(String),
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task creation and query service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Posts a new task in [`TaskStatus::New`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when input validation fails or the
    /// repository rejects persistence.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let data = NewTaskData {
            client_id: request.client_id,
            category: Category::new(request.category)?,
            title: request.title,
            description: request.description,
            expire_at: request.expire_at,
        };
        let task = Task::post(data, &*self.clock)?;
        self.repository.store(&task).await?;
        tracing::debug!(task_id = %task.id(), client_id = %task.client_id(), "task posted");
        Ok(task)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Retrieves the opinion left on a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn find_opinion(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Opinion>> {
        Ok(self.repository.find_opinion_by_task(task_id).await?)
    }

    /// Lists tasks open for offers, newest first, optionally within one
    /// category.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn list_open(&self, category: Option<&Category>) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.list_open(category.cloned()).await?)
    }

    /// Lists the user's tasks in the given bucket, from the client or
    /// contractor side.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        role: UserRole,
        filter: TaskListFilter,
    ) -> TaskLifecycleResult<Vec<Task>> {
        let statuses = filter.statuses();
        let tasks = match role {
            UserRole::Client => self.repository.list_for_client(user_id, statuses).await?,
            UserRole::Contractor => self.repository.list_for_performer(user_id, statuses).await?,
        };
        if filter != TaskListFilter::Expired {
            return Ok(tasks);
        }
        let now = self.clock.utc();
        Ok(tasks.into_iter().filter(|task| task.is_expired(now)).collect())
    }

    /// Returns `true` when the performer has a task in progress.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn is_busy(&self, performer_id: UserId) -> TaskLifecycleResult<bool> {
        let active = self
            .repository
            .list_for_performer(performer_id, &[TaskStatus::InProgress])
            .await?;
        Ok(!active.is_empty())
    }

    /// Returns `true` when `viewer_id` may see the performer's contacts.
    ///
    /// Hidden contacts are shown only to the performer and to clients who
    /// have assigned the performer one of their tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn are_contacts_visible(
        &self,
        performer: &Performer,
        viewer_id: UserId,
    ) -> TaskLifecycleResult<bool> {
        if !performer.hide_contacts() || performer.id() == viewer_id {
            return Ok(true);
        }
        let assigned = self
            .repository
            .list_for_performer(performer.id(), &TaskStatus::ALL)
            .await?;
        Ok(assigned.iter().any(|task| task.client_id() == viewer_id))
    }
}
