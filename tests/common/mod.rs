#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use parking_reservation::application::reservation::{
    BookingRequest, ReservationEngine, ReservationSettings,
};
use parking_reservation::application::{create_event_bus, SharedEventBus};
use parking_reservation::domain::{ParkingSlot, RepositoryProvider, SlotCategory, Tariff, TariffUnit};
use parking_reservation::infrastructure::InMemoryRepositoryProvider;
use parking_reservation::shared::clock::ManualClock;
use parking_reservation::shared::retry::RetryPolicy;

pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
}

pub fn hourly_tariff() -> Tariff {
    Tariff::new(1, "Hourly", TariffUnit::Hourly, Decimal::new(1000, 2), "EUR")
}

pub fn seeded_store() -> Arc<InMemoryRepositoryProvider> {
    let store = Arc::new(InMemoryRepositoryProvider::new());
    for id in ["S1", "S2", "S3"] {
        store.insert_slot(ParkingSlot::new(id, "P1", SlotCategory::Standard));
    }
    store.insert_tariff(hourly_tariff());
    store
}

pub fn fast_settings() -> ReservationSettings {
    ReservationSettings {
        lock_timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
        },
        ..Default::default()
    }
}

pub struct Harness {
    pub engine: Arc<ReservationEngine>,
    pub clock: Arc<ManualClock>,
    pub bus: SharedEventBus,
}

pub fn harness_on(repos: Arc<dyn RepositoryProvider>, settings: ReservationSettings) -> Harness {
    let clock = Arc::new(ManualClock::new(at(8, 0)));
    let bus = create_event_bus();
    let engine = Arc::new(ReservationEngine::new(
        repos,
        bus.clone(),
        clock.clone(),
        settings,
    ));
    Harness { engine, clock, bus }
}

pub fn harness() -> Harness {
    harness_on(seeded_store(), fast_settings())
}

pub fn request(user: &str, slot: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        user_id: user.into(),
        slot_id: slot.into(),
        start_time: start,
        end_time: end,
        tariff_id: 1,
        vehicle_id: None,
    }
}
