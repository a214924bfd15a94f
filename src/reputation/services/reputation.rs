//! Service layer for performer rating and leaderboard queries.

use crate::reputation::{
    domain::{Performer, PerformerStanding, RankedPerformer, Rating, rank_standings},
    ports::{PerformerRepository, PerformerRepositoryError},
};
use crate::task::domain::{Opinion, UserId};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for reputation operations.
#[derive(Debug, Error)]
pub enum ReputationError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] PerformerRepositoryError),
}

/// Result type for reputation service operations.
pub type ReputationResult<T> = Result<T, ReputationError>;

/// Reputation figures shown on a performer profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationSummary {
    /// The performer.
    pub performer: Performer,
    /// Rating, absent until the first opinion.
    pub rating: Option<Rating>,
    /// Leaderboard position.
    pub rank: Option<u32>,
    /// Opinions received, newest first.
    pub opinions: Vec<Opinion>,
}

/// Read-only rating and ranking service.
#[derive(Clone)]
pub struct ReputationService<R, C>
where
    R: PerformerRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ReputationService<R, C>
where
    R: PerformerRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new reputation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Registers a user as a performer.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Repository`] when the performer already
    /// exists or persistence fails.
    pub async fn register_performer(&self, user_id: UserId) -> ReputationResult<Performer> {
        let performer = Performer::register(user_id, &*self.clock);
        self.repository.register(&performer).await?;
        tracing::debug!(performer_id = %user_id, "performer registered");
        Ok(performer)
    }

    /// Returns the performer's rating, or `None` when they have no opinions
    /// or are unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Repository`] when the standings read fails.
    pub async fn rating(&self, performer_id: UserId) -> ReputationResult<Option<Rating>> {
        let standings = self.repository.load_standings().await?;
        Ok(find_standing(&standings, performer_id).and_then(PerformerStanding::rating))
    }

    /// Returns the performer's 1-based leaderboard position, or `None` when
    /// the performer is not registered.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Repository`] when the standings read fails.
    pub async fn rank(&self, performer_id: UserId) -> ReputationResult<Option<u32>> {
        let leaderboard = self.leaderboard().await?;
        Ok(rank_of(&leaderboard, performer_id))
    }

    /// Returns every performer in leaderboard order.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Repository`] when the standings read fails.
    pub async fn leaderboard(&self) -> ReputationResult<Vec<RankedPerformer>> {
        let standings = self.repository.load_standings().await?;
        Ok(rank_standings(standings))
    }

    /// Collects profile reputation figures from one standings snapshot.
    ///
    /// Returns `None` for unknown performers.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Repository`] when any read fails.
    pub async fn summary(&self, performer_id: UserId) -> ReputationResult<Option<ReputationSummary>> {
        let Some(performer) = self.repository.find_by_id(performer_id).await? else {
            return Ok(None);
        };
        let leaderboard = self.leaderboard().await?;
        let rating = leaderboard
            .iter()
            .find(|entry| entry.standing.performer_id == performer_id)
            .and_then(|entry| entry.standing.rating());
        let opinions = self.repository.find_opinions(performer_id).await?;

        Ok(Some(ReputationSummary {
            performer,
            rating,
            rank: rank_of(&leaderboard, performer_id),
            opinions,
        }))
    }
}

fn find_standing(standings: &[PerformerStanding], performer_id: UserId) -> Option<&PerformerStanding> {
    standings
        .iter()
        .find(|standing| standing.performer_id == performer_id)
}

fn rank_of(leaderboard: &[RankedPerformer], performer_id: UserId) -> Option<u32> {
    leaderboard
        .iter()
        .find(|entry| entry.standing.performer_id == performer_id)
        .map(|entry| entry.rank)
}
