//! Task aggregate root.

use super::{Category, TaskDomainError, TaskId, TaskStatus, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Version assigned to a task when it is first stored.
pub const INITIAL_TASK_VERSION: u64 = 1;

/// Marketplace task posted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    client_id: UserId,
    performer_id: Option<UserId>,
    category: Category,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    expire_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

/// Validated fields for posting a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Client posting the task.
    pub client_id: UserId,
    /// Task category.
    pub category: Category,
    /// Short task title.
    pub title: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Optional deadline.
    pub expire_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted client reference.
    pub client_id: UserId,
    /// Persisted performer reference, if assigned.
    pub performer_id: Option<UserId>,
    /// Persisted category.
    pub category: Category,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted deadline.
    pub expire_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted optimistic concurrency version.
    pub version: u64,
}

impl Task {
    /// Creates a new task in [`TaskStatus::New`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn post(data: NewTaskData, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = data.title.trim();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let timestamp = clock.utc();

        Ok(Self {
            id: TaskId::new(),
            client_id: data.client_id,
            performer_id: None,
            category: data.category,
            title: title.to_owned(),
            description: data
                .description
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty()),
            status: TaskStatus::New,
            expire_at: data.expire_at,
            created_at: timestamp,
            updated_at: timestamp,
            version: INITIAL_TASK_VERSION,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            client_id: data.client_id,
            performer_id: data.performer_id,
            category: data.category,
            title: data.title,
            description: data.description,
            status: data.status,
            expire_at: data.expire_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
            version: data.version,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the client who posted the task.
    #[must_use]
    pub const fn client_id(&self) -> UserId {
        self.client_id
    }

    /// Returns the assigned performer, if any.
    #[must_use]
    pub const fn performer_id(&self) -> Option<UserId> {
        self.performer_id
    }

    /// Returns the task category.
    #[must_use]
    pub const fn category(&self) -> &Category {
        &self.category
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the task lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the task deadline, if any.
    #[must_use]
    pub const fn expire_at(&self) -> Option<DateTime<Utc>> {
        self.expire_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` when the task is in progress past its deadline.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::InProgress && self.expire_at.is_some_and(|deadline| deadline < now)
    }

    /// Assigns a performer to the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Validation`] when a performer is already
    /// assigned or the performer is the task's own client.
    pub fn assign_performer(&mut self, performer_id: UserId) -> Result<(), TaskDomainError> {
        if self.performer_id.is_some() {
            return Err(TaskDomainError::Validation(format!(
                "task {} already has a performer",
                self.id
            )));
        }
        if performer_id == self.client_id {
            return Err(TaskDomainError::Validation(
                "a client cannot perform their own task".to_owned(),
            ));
        }
        self.performer_id = Some(performer_id);
        Ok(())
    }

    /// Moves the task to `status` and records the change time.
    ///
    /// Legality is decided by [`super::StatusRegistry`]; this only enforces
    /// that non-new tasks carry a performer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoPerformerAssigned`] when the task would
    /// leave [`TaskStatus::New`] without a performer.
    pub(crate) fn set_status(
        &mut self,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if status != TaskStatus::New && self.performer_id.is_none() {
            return Err(TaskDomainError::NoPerformerAssigned(self.id));
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Advances the version after a successful commit.
    pub(crate) const fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }
}
