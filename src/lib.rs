//! Taskforce: task-marketplace workflow core.
//!
//! Clients post tasks, contractors are assigned to them, and tasks move
//! through a status lifecycle. Completing a task records a rated opinion;
//! refusing one counts against the contractor. Both feed the contractor's
//! reputation score and leaderboard rank.
//!
//! # Architecture
//!
//! Taskforce follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`task`]: Task posting, the status registry, actions, and the workflow
//!   engine
//! - [`reputation`]: Performer ratings and ranking
//! - [`config`]: Workflow retry configuration

pub mod config;
pub mod reputation;
pub mod task;
