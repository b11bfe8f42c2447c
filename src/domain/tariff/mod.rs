//! Tariff aggregate
//!
//! Contains the Tariff entity, the snapshot stored on bookings, and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::{Tariff, TariffSnapshot, TariffUnit};
pub use repository::TariffRepository;
