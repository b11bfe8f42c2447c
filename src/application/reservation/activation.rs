//! Background task that moves started bookings along.
//!
//! Every `interval_secs` it looks for `pending` bookings whose window has
//! begun. Those still inside their window are activated; those whose window
//! already ended are cancelled as no-shows through the administrative
//! override.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{info, warn};

use super::engine::ReservationEngine;
use crate::domain::{Actor, DomainResult};
use crate::shared::shutdown::ShutdownSignal;

/// Identity recorded as `cancelled_by` on no-show cancellations
pub const SWEEP_ACTOR_ID: &str = "activation-sweep";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub activated: usize,
    pub expired: usize,
    pub failed: usize,
}

/// Start the activation sweep. The task stops when `shutdown` fires.
pub fn start_activation_task(
    engine: Arc<ReservationEngine>,
    shutdown: ShutdownSignal,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval = interval_secs, "Activation sweep started");

        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = sweep_once(&engine).await {
                        warn!(error = %e, "Activation sweep failed");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Activation sweep shutting down");
                    break;
                }
            }
        }

        info!("Activation sweep stopped");
    })
}

/// One pass over the started `pending` bookings.
///
/// A booking that changed concurrently (someone else activated or cancelled
/// it) is counted as failed and left alone.
pub async fn sweep_once(engine: &ReservationEngine) -> DomainResult<SweepReport> {
    let now = engine.now();
    let started = engine
        .repositories()
        .bookings()
        .find_pending_started(now)
        .await?;

    let mut report = SweepReport::default();
    if started.is_empty() {
        engine.locks().prune();
        return Ok(report);
    }

    info!(count = started.len(), "Sweeping started bookings");
    let sweeper = Actor::admin(SWEEP_ACTOR_ID);

    for booking in started {
        let result = if now < booking.end_time {
            engine.activate_booking(booking.id, false).await.map(|_| {
                report.activated += 1;
            })
        } else {
            engine.cancel_booking(booking.id, &sweeper).await.map(|_| {
                report.expired += 1;
            })
        };

        if let Err(e) = result {
            report.failed += 1;
            warn!(booking_id = %booking.id, error = %e, "Failed to sweep booking");
        }
    }

    engine.locks().prune();
    info!(
        activated = report.activated,
        expired = report.expired,
        failed = report.failed,
        "Activation sweep finished"
    );
    Ok(report)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::reservation::engine::ReservationSettings;
    use crate::application::reservation::state_machine::BookingRequest;
    use crate::domain::booking::{Booking, BookingStatus};
    use crate::domain::slot::{ParkingSlot, SlotCategory};
    use crate::domain::tariff::{Tariff, TariffUnit};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::clock::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn engine(clock: Arc<ManualClock>) -> Arc<ReservationEngine> {
        let store = Arc::new(InMemoryRepositoryProvider::new());
        for id in ["S1", "S2"] {
            store.insert_slot(ParkingSlot::new(id, "P1", SlotCategory::Standard));
        }
        store.insert_tariff(Tariff::new(1, "Hourly", TariffUnit::Hourly, Decimal::ONE, "EUR"));
        Arc::new(ReservationEngine::new(
            store,
            create_event_bus(),
            clock,
            ReservationSettings::default(),
        ))
    }

    fn request(slot: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            user_id: "U1".into(),
            slot_id: slot.into(),
            start_time: start,
            end_time: end,
            tariff_id: 1,
            vehicle_id: None,
        }
    }

    #[tokio::test]
    async fn activates_started_and_expires_missed_bookings() {
        let clock = Arc::new(ManualClock::new(at(7, 0)));
        let engine = engine(clock.clone());
        let started = engine
            .create_booking(request("S1", at(9, 0), at(11, 0)))
            .await
            .unwrap();
        let missed = engine
            .create_booking(request("S2", at(7, 30), at(8, 30)))
            .await
            .unwrap();
        let future = engine
            .create_booking(request("S1", at(12, 0), at(13, 0)))
            .await
            .unwrap();

        clock.set(at(9, 15));
        let report = sweep_once(&engine).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                activated: 1,
                expired: 1,
                failed: 0
            }
        );

        let status = |b: Booking| b.status;
        assert_eq!(
            status(engine.get_booking(started.id).await.unwrap()),
            BookingStatus::Active
        );
        assert_eq!(
            status(engine.get_booking(missed.id).await.unwrap()),
            BookingStatus::Cancelled
        );
        assert_eq!(
            status(engine.get_booking(future.id).await.unwrap()),
            BookingStatus::Pending
        );
    }

    #[tokio::test]
    async fn empty_sweep_reports_nothing() {
        let engine = engine(Arc::new(ManualClock::new(at(7, 0))));
        assert_eq!(sweep_once(&engine).await.unwrap(), SweepReport::default());
    }

    #[tokio::test]
    async fn task_stops_on_shutdown() {
        let engine = engine(Arc::new(ManualClock::new(at(7, 0))));
        let shutdown = ShutdownSignal::new();
        let handle = start_activation_task(engine, shutdown.clone(), 3600);
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep task did not stop")
            .unwrap();
    }
}
