//! Adapter implementations of the task and reputation ports.

pub mod memory;
pub mod postgres;
