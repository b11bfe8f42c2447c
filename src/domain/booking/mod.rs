//! Booking aggregate
//!
//! Contains the Booking entity, its lifecycle and payment states, and the
//! versioned repository interface used for conflict-free writes.

pub mod model;
pub mod repository;

pub use model::{Booking, BookingStatus, PaymentStatus};
pub use repository::{BookingRepository, SlotBookings};
