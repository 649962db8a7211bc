//! # streak-ledger
//!
//! The plan document (a week-paginated tabular store) and the small durable
//! interaction-state record that survives process restarts.

pub mod plan;
pub mod state;

pub use plan::{DayEntry, PlanDocument, PlanError, Status};
pub use state::{InteractionState, StateStore};

#[cfg(test)]
mod tests;
