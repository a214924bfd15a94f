//! Rating and ranking arithmetic.
//!
//! Scores are exact fractions `rate_sum / (opinion_count + fail_count)`.
//! Failures add to the divisor without adding to the sum, so every refused
//! task drags the score down. Comparisons cross-multiply in `u128` and never
//! touch floating point.

use crate::task::domain::UserId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Aggregated reputation inputs for one performer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformerStanding {
    /// Performer the figures belong to.
    pub performer_id: UserId,
    /// Sum of all opinion rates.
    pub rate_sum: u64,
    /// Number of opinions.
    pub opinion_count: u64,
    /// Number of refused tasks.
    pub fail_count: u32,
}

impl PerformerStanding {
    /// Creates a standing with no opinions and no failures.
    #[must_use]
    pub const fn empty(performer_id: UserId) -> Self {
        Self {
            performer_id,
            rate_sum: 0,
            opinion_count: 0,
            fail_count: 0,
        }
    }

    /// Returns the ranking score, or `None` when there is nothing to divide.
    #[must_use]
    pub fn score(&self) -> Option<ReputationScore> {
        let denominator = self.opinion_count.saturating_add(u64::from(self.fail_count));
        if denominator == 0 {
            return None;
        }
        Some(ReputationScore {
            numerator: self.rate_sum,
            denominator,
        })
    }

    /// Returns the displayed rating, or `None` without opinions.
    #[must_use]
    pub fn rating(&self) -> Option<Rating> {
        if self.opinion_count == 0 {
            return None;
        }
        self.score().map(Rating::from_score)
    }
}

/// Exact reputation ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReputationScore {
    numerator: u64,
    denominator: u64,
}

impl ReputationScore {
    /// Returns the ratio's numerator (sum of rates).
    #[must_use]
    pub const fn numerator(self) -> u64 {
        self.numerator
    }

    /// Returns the ratio's denominator (opinions plus failures).
    #[must_use]
    pub const fn denominator(self) -> u64 {
        self.denominator
    }
}

impl PartialEq for ReputationScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReputationScore {}

impl PartialOrd for ReputationScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReputationScore {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = u128::from(self.numerator) * u128::from(other.denominator);
        let right = u128::from(other.numerator) * u128::from(self.denominator);
        left.cmp(&right)
    }
}

/// Rating rounded half-up to two decimal places, held in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u64);

impl Rating {
    /// Rounds a score to hundredths.
    #[must_use]
    pub fn from_score(score: ReputationScore) -> Self {
        let doubled_denominator = u128::from(score.denominator).saturating_mul(2);
        let scaled = u128::from(score.numerator)
            .saturating_mul(200)
            .saturating_add(u128::from(score.denominator));
        let hundredths = scaled.checked_div(doubled_denominator).unwrap_or_default();
        Self(u64::try_from(hundredths).unwrap_or(u64::MAX))
    }

    /// Creates a rating from a value in hundredths.
    #[must_use]
    pub const fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    /// Returns the rating in hundredths (`3.00` is `300`).
    #[must_use]
    pub const fn hundredths(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0.div_euclid(100), self.0.rem_euclid(100))
    }
}

/// Performer placed on the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPerformer {
    /// 1-based leaderboard position.
    pub rank: u32,
    /// The standing the position was computed from.
    pub standing: PerformerStanding,
}

/// Orders standings by descending score.
///
/// Standings without a score follow every scored one. The sort is stable, so
/// equal scores keep the input order.
#[must_use]
pub fn rank_standings(mut standings: Vec<PerformerStanding>) -> Vec<RankedPerformer> {
    standings.sort_by(|left, right| compare_descending(left.score(), right.score()));
    standings
        .into_iter()
        .zip(1_u32..)
        .map(|(standing, rank)| RankedPerformer { rank, standing })
        .collect()
}

fn compare_descending(left: Option<ReputationScore>, right: Option<ReputationScore>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
