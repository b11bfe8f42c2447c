pub mod events;
pub mod reservation;

// Re-export key types for convenience
pub use events::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use reservation::{
    start_activation_task, BookingRequest, CancelAuthority, PricingEngine, ReservationEngine,
    ReservationSettings,
};
