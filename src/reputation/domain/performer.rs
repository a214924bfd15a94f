//! Performer profile data relevant to reputation.

use crate::task::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Contractor-side view of a marketplace user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performer {
    id: UserId,
    fail_count: u32,
    hide_contacts: bool,
    registered_at: DateTime<Utc>,
}

impl Performer {
    /// Registers a performer with no failures.
    #[must_use]
    pub fn register(id: UserId, clock: &impl Clock) -> Self {
        Self {
            id,
            fail_count: 0,
            hide_contacts: false,
            registered_at: clock.utc(),
        }
    }

    /// Reconstructs a performer from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: UserId,
        fail_count: u32,
        hide_contacts: bool,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            fail_count,
            hide_contacts,
            registered_at,
        }
    }

    /// Restricts contact details to clients who have worked with the
    /// performer.
    #[must_use]
    pub const fn with_hidden_contacts(mut self) -> Self {
        self.hide_contacts = true;
        self
    }

    /// Returns the performer's user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the number of refused tasks.
    #[must_use]
    pub const fn fail_count(&self) -> u32 {
        self.fail_count
    }

    /// Returns `true` when contacts are restricted.
    #[must_use]
    pub const fn hide_contacts(&self) -> bool {
        self.hide_contacts
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Adds `delta` to the fail count.
    pub(crate) const fn record_failures(&mut self, delta: u32) {
        self.fail_count = self.fail_count.saturating_add(delta);
    }
}
