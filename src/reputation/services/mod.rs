//! Application services for reputation queries.

mod reputation;

pub use reputation::{ReputationError, ReputationResult, ReputationService, ReputationSummary};
