//! In-memory adapters for the task workflow and reputation ports.

mod marketplace;

pub use marketplace::InMemoryMarketplace;
