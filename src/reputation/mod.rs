//! Performer reputation: ratings and the leaderboard.
//!
//! A performer's score is the sum of their opinion rates divided by the
//! number of opinions plus the number of tasks they refused. Reads go
//! through [`ports::PerformerRepository::load_standings`], which returns
//! every performer's aggregated figures in one batch; ranking happens in
//! memory. Storage adapters live with the task adapters because a refused
//! task updates the performer's fail count in the same commit.

pub mod domain;
pub mod ports;
pub mod services;
