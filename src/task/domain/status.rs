//! Task status values and the transition graph between them.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been posted by a client and awaits a performer.
    New,
    /// A performer has been assigned and is working on the task.
    InProgress,
    /// The client accepted the work and left an opinion.
    Complete,
    /// The task was marked as failed.
    Fail,
    /// The client cancelled the task.
    Cancel,
    /// The performer refused the task after assignment.
    Deny,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::New,
        Self::InProgress,
        Self::Complete,
        Self::Fail,
        Self::Cancel,
        Self::Deny,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Fail => "fail",
            Self::Cancel => "cancel",
            Self::Deny => "deny",
        }
    }

    /// Returns `true` when no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Fail | Self::Cancel | Self::Deny
        )
    }

    /// Returns `true` when `target` is directly reachable from this status.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::New, Self::InProgress)
                | (
                    Self::InProgress,
                    Self::Complete | Self::Fail | Self::Cancel | Self::Deny
                )
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            "fail" => Ok(Self::Fail),
            "cancel" => Ok(Self::Cancel),
            "deny" => Ok(Self::Deny),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
