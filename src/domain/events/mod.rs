//! Reservation lifecycle events and payment intents

pub mod types;

pub use types::*;
