//! Opinions left by clients when accepting completed work.

use super::{OpinionId, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opinion rate on the inclusive 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rate(u8);

impl Rate {
    /// Lowest accepted rate.
    pub const MIN: u8 = 1;
    /// Highest accepted rate.
    pub const MAX: u8 = 5;

    /// Creates a validated rate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRate`] when the value is outside
    /// `1..=5`.
    pub const fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(TaskDomainError::InvalidRate(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric rate.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rate {
    type Error = TaskDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rate> for u8 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated opinion input supplied with a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionDraft {
    rate: Rate,
    comment: String,
}

impl OpinionDraft {
    /// Creates an opinion draft, validating the rate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRate`] for out-of-range rates.
    pub fn new(rate: u8, comment: impl Into<String>) -> Result<Self, TaskDomainError> {
        Ok(Self {
            rate: Rate::new(rate)?,
            comment: comment.into().trim().to_owned(),
        })
    }

    /// Returns the rate.
    #[must_use]
    pub const fn rate(&self) -> Rate {
        self.rate
    }

    /// Returns the free-text comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// Rated opinion attached to exactly one completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opinion {
    id: OpinionId,
    task_id: TaskId,
    performer_id: UserId,
    rate: Rate,
    comment: String,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted opinion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOpinionData {
    /// Persisted opinion identifier.
    pub id: OpinionId,
    /// Task the opinion belongs to.
    pub task_id: TaskId,
    /// Performer the opinion rates.
    pub performer_id: UserId,
    /// Persisted rate.
    pub rate: Rate,
    /// Persisted comment.
    pub comment: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Opinion {
    /// Creates an opinion for `performer_id` on `task_id` from a draft.
    #[must_use]
    pub fn from_draft(
        task_id: TaskId,
        performer_id: UserId,
        draft: &OpinionDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OpinionId::new(),
            task_id,
            performer_id,
            rate: draft.rate(),
            comment: draft.comment().to_owned(),
            created_at,
        }
    }

    /// Reconstructs an opinion from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOpinionData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            performer_id: data.performer_id,
            rate: data.rate,
            comment: data.comment,
            created_at: data.created_at,
        }
    }

    /// Returns the opinion identifier.
    #[must_use]
    pub const fn id(&self) -> OpinionId {
        self.id
    }

    /// Returns the rated task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the rated performer.
    #[must_use]
    pub const fn performer_id(&self) -> UserId {
        self.performer_id
    }

    /// Returns the rate.
    #[must_use]
    pub const fn rate(&self) -> Rate {
        self.rate
    }

    /// Returns the comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
