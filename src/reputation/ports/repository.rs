//! Repository port for performer records and their reputation inputs.

use crate::reputation::domain::{Performer, PerformerStanding};
use crate::task::domain::{Opinion, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for performer repository operations.
pub type PerformerRepositoryResult<T> = Result<T, PerformerRepositoryError>;

/// Performer persistence and batch reputation reads.
#[async_trait]
pub trait PerformerRepository: Send + Sync {
    /// Stores a new performer.
    ///
    /// # Errors
    ///
    /// Returns [`PerformerRepositoryError::DuplicatePerformer`] when the
    /// performer is already registered.
    async fn register(&self, performer: &Performer) -> PerformerRepositoryResult<()>;

    /// Finds a performer by user identifier.
    async fn find_by_id(&self, id: UserId) -> PerformerRepositoryResult<Option<Performer>>;

    /// Returns one standing per registered performer in a single read, in
    /// registration order.
    async fn load_standings(&self) -> PerformerRepositoryResult<Vec<PerformerStanding>>;

    /// Returns every opinion left for a performer, newest first.
    async fn find_opinions(&self, performer_id: UserId) -> PerformerRepositoryResult<Vec<Opinion>>;
}

/// Errors returned by performer repository implementations.
#[derive(Debug, Clone, Error)]
pub enum PerformerRepositoryError {
    /// The performer is already registered.
    #[error("duplicate performer: {0}")]
    DuplicatePerformer(UserId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PerformerRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
