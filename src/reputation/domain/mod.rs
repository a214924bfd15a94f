//! Domain model for performer reputation.

mod performer;
mod score;

pub use performer::Performer;
pub use score::{PerformerStanding, RankedPerformer, Rating, ReputationScore, rank_standings};
