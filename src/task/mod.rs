//! Task workflow for the marketplace.
//!
//! Tasks are posted by clients and advance through
//! `new -> in_progress -> complete | fail | cancel | deny`. Every change goes
//! through [`services::TaskWorkflowService`], which consults the
//! [`domain::StatusRegistry`], lets the requested [`domain::TaskAction`]
//! prepare its side effects, and commits the new status together with those
//! effects in one repository call. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
