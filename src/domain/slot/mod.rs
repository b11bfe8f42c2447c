//! Parking slot aggregate
//!
//! Slot metadata comes from the site registry; occupancy is never stored,
//! it is derived from the slot's bookings.

pub mod model;
pub mod repository;

pub use model::{ParkingSlot, SlotCategory, SlotStatus};
pub use repository::SlotRepository;
