pub mod actor;
pub mod booking;
pub mod events;
pub mod repositories;
pub mod slot;
pub mod tariff;

// Re-export commonly used types
pub use actor::{Actor, Role};
pub use booking::{Booking, BookingRepository, BookingStatus, PaymentStatus, SlotBookings};
pub use events::{Event, EventMessage};
pub use repositories::{DomainResult, RepositoryProvider};
pub use slot::{ParkingSlot, SlotCategory, SlotRepository, SlotStatus};
pub use tariff::{Tariff, TariffRepository, TariffSnapshot, TariffUnit};

pub use crate::shared::errors::DomainError;
