//! # Parking Reservation
//!
//! Slot reservation engine for parking sites: availability, pricing and the
//! booking lifecycle, serialized per slot so that two overlapping bookings
//! can never both be accepted.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: slots, tariffs, bookings, events and repository traits
//! - **application**: the reservation engine and its collaborators
//! - **infrastructure**: in-memory and SeaORM/SQLite storage
//! - **shared**: errors, retry, clock and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export the engine surface
pub use application::{
    create_event_bus, BookingRequest, EventBus, ReservationEngine, ReservationSettings,
    SharedEventBus,
};
pub use domain::{Actor, Booking, BookingStatus, DomainError, PaymentStatus, SlotStatus};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider};
