//! Port contracts for reputation reads.

pub mod repository;

pub use repository::{PerformerRepository, PerformerRepositoryError, PerformerRepositoryResult};
