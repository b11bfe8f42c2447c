//! Database entities module

pub mod booking;
pub mod parking_slot;
pub mod slot_version;
pub mod tariff;

pub use booking::Entity as Booking;
pub use parking_slot::Entity as ParkingSlot;
pub use slot_version::Entity as SlotVersion;
pub use tariff::Entity as Tariff;
