//! # streak-core
//!
//! Core types, traits, configuration, and error handling for the Streak bot.

pub mod config;
pub mod error;
pub mod message;
pub mod slot;
pub mod traits;

pub use config::shellexpand;
