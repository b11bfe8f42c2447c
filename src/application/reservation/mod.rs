//! Slot reservation: availability, pricing, lifecycle and the engine that
//! serializes them per slot.

pub mod activation;
pub mod availability;
pub mod engine;
pub mod pricing;
pub mod slot_locks;
pub mod state_machine;
pub mod tariff_resolver;

pub use activation::{start_activation_task, sweep_once, SweepReport};
pub use availability::{Availability, AvailabilityCalculator};
pub use engine::{ReservationEngine, ReservationSettings};
pub use pricing::{PricingEngine, Reconciliation};
pub use slot_locks::{SlotGuard, SlotLocks};
pub use state_machine::{
    generate_access_token, BookingRequest, BookingStateMachine, CancelAuthority, Transition,
};
pub use tariff_resolver::TariffResolver;
