//! Reservation engine
//!
//! The single entry point for every booking mutation. Each mutation runs as
//! one critical section per slot:
//!
//! 1. acquire the slot's lock (bounded, `Busy` on timeout)
//! 2. read the slot's live bookings and version
//! 3. decide the next state (availability check, state machine)
//! 4. commit against the version read in step 2
//! 5. release the lock, then publish events
//!
//! A commit that loses the version race, or a transient storage failure,
//! re-runs steps 2-4 a bounded number of times. Because availability is
//! re-checked on every attempt, a lost race for an overlapping window ends
//! in `SlotConflict`, never in a double booking.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::availability::{self, AvailabilityCalculator};
use super::pricing::PricingEngine;
use super::slot_locks::SlotLocks;
use super::state_machine::{BookingRequest, BookingStateMachine, CancelAuthority, Transition};
use super::tariff_resolver::TariffResolver;
use crate::application::events::SharedEventBus;
use crate::domain::booking::Booking;
use crate::domain::events::{Event, SlotStatusChangedEvent};
use crate::domain::slot::{ParkingSlot, SlotStatus};
use crate::domain::tariff::Tariff;
use crate::domain::{Actor, DomainResult, RepositoryProvider};
use crate::shared::clock::SharedClock;
use crate::shared::errors::DomainError;
use crate::shared::retry::{retry_with_backoff, RetryPolicy};

/// Tunables for the engine
#[derive(Debug, Clone)]
pub struct ReservationSettings {
    /// Upper bound on waiting for a slot's critical section
    pub lock_timeout: Duration,
    /// Retry budget for transient failures inside the critical section
    pub retry: RetryPolicy,
    pub overstay_multiplier: Decimal,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(2000),
            retry: RetryPolicy::default(),
            overstay_multiplier: Decimal::ONE,
        }
    }
}

pub struct ReservationEngine {
    repos: Arc<dyn RepositoryProvider>,
    tariffs: TariffResolver,
    availability: AvailabilityCalculator,
    machine: BookingStateMachine,
    locks: SlotLocks,
    events: SharedEventBus,
    clock: SharedClock,
    retry: RetryPolicy,
}

impl ReservationEngine {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        events: SharedEventBus,
        clock: SharedClock,
        settings: ReservationSettings,
    ) -> Self {
        Self {
            tariffs: TariffResolver::new(repos.clone()),
            availability: AvailabilityCalculator::new(repos.clone()),
            machine: BookingStateMachine::new(PricingEngine::new(settings.overstay_multiplier)),
            locks: SlotLocks::new(settings.lock_timeout),
            repos,
            events,
            clock,
            retry: settings.retry,
        }
    }

    pub fn locks(&self) -> &SlotLocks {
        &self.locks
    }

    pub fn repositories(&self) -> &Arc<dyn RepositoryProvider> {
        &self.repos
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Mutations ──────────────────────────────────────────────

    /// Reserve `request.slot_id` for `[start_time, end_time)`.
    ///
    /// The returned booking is `pending`, carries the quoted price and an
    /// access token, and has been durably stored.
    pub async fn create_booking(&self, request: BookingRequest) -> DomainResult<Booking> {
        Booking::validate_interval(request.start_time, request.end_time)?;
        let slot = self.active_slot(&request.slot_id).await?;
        let tariff = self.tariffs.resolve(&slot, request.tariff_id).await?;

        let guard = self.locks.acquire(&slot.id).await?;
        let request = &request;
        let tariff = &tariff;
        let outcome = retry_with_backoff(
            &self.retry,
            "create_booking",
            DomainError::is_transient,
            move |_| self.try_create(request, tariff),
        )
        .await;
        drop(guard);

        let (booking, events) = match outcome {
            Ok(done) => done,
            Err(e) => {
                if let DomainError::SlotConflict { conflicting, .. } = &e {
                    metrics::counter!("reservation_slot_conflicts_total").increment(1);
                    warn!(
                        slot_id = %slot.id,
                        user_id = %request.user_id,
                        conflicting = ?conflicting,
                        "Booking rejected, slot not available"
                    );
                }
                return Err(e.exhausted(&slot.id));
            }
        };

        metrics::counter!("reservation_bookings_created_total").increment(1);
        metrics::counter!("reservation_transitions_total", "to" => booking.status.as_str())
            .increment(1);
        info!(
            booking_id = %booking.id,
            slot_id = %booking.slot_id,
            user_id = %booking.user_id,
            total_price = %booking.total_price,
            currency = %booking.tariff.currency,
            "Booking created"
        );
        self.publish(events);
        Ok(booking)
    }

    /// Cancel on behalf of `actor`. Owners may cancel a pending booking
    /// before its window starts; administrators may cancel any live booking.
    pub async fn cancel_booking(&self, booking_id: Uuid, actor: &Actor) -> DomainResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        if !actor.can_manage(&booking) {
            warn!(
                booking_id = %booking_id,
                user_id = %actor.user_id,
                "Cancellation refused, caller does not own the booking"
            );
            return Err(DomainError::Forbidden(format!(
                "{} may not cancel booking {}",
                actor.user_id, booking_id
            )));
        }

        let authority = if actor.is_admin() {
            CancelAuthority::Override
        } else {
            CancelAuthority::Requester
        };
        let machine = &self.machine;
        let cancelled_by = actor.user_id.as_str();
        self.mutate(booking_id, &booking.slot_id, "cancel_booking", |current, now| {
            machine.cancel(current, cancelled_by, authority, now)
        })
        .await
    }

    /// Finish the stay at `actual_end` and reconcile the price.
    pub async fn complete_booking(
        &self,
        booking_id: Uuid,
        actual_end: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let machine = &self.machine;
        self.mutate(booking_id, &booking.slot_id, "complete_booking", |current, now| {
            machine.complete(current, actual_end, now)
        })
        .await
    }

    /// `pending → active`. With `start_now` the booking may be started
    /// ahead of its window.
    pub async fn activate_booking(&self, booking_id: Uuid, start_now: bool) -> DomainResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let machine = &self.machine;
        self.mutate(booking_id, &booking.slot_id, "activate_booking", |current, now| {
            machine.activate(current, start_now, now)
        })
        .await
    }

    /// Record a successful charge reported by the payment service.
    pub async fn confirm_payment(&self, booking_id: Uuid) -> DomainResult<Booking> {
        let booking = self.get_booking(booking_id).await?;
        let machine = &self.machine;
        self.mutate(booking_id, &booking.slot_id, "confirm_payment", |current, now| {
            machine.confirm_payment(current, now)
        })
        .await
    }

    // ── Reads (lock-free) ──────────────────────────────────────

    pub async fn get_booking(&self, booking_id: Uuid) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "id", booking_id))
    }

    /// Newest first
    pub async fn list_user_bookings(&self, user_id: &str) -> DomainResult<Vec<Booking>> {
        self.repos.bookings().find_by_user(user_id).await
    }

    /// Ids of the bookable slots of `parking_id` free for the whole window
    pub async fn list_availability(
        &self,
        parking_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<String>> {
        self.availability.available_slots(parking_id, start, end).await
    }

    /// Whether `[start, end)` is free on `slot_id`. `excluding` ignores one
    /// booking, so a booking can be checked against the rest of its slot.
    pub async fn is_available(
        &self,
        slot_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> DomainResult<bool> {
        self.availability
            .is_available(slot_id, start, end, excluding)
            .await
    }

    /// Occupancy derived from the slot's current bookings
    pub async fn slot_status(&self, slot_id: &str) -> DomainResult<SlotStatus> {
        let slot = self
            .repos
            .slots()
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", slot_id))?;
        let ledger = self.repos.bookings().load_slot(slot_id).await?;
        Ok(slot.derive_status(&ledger.bookings, self.clock.now()))
    }

    // ── Critical sections ──────────────────────────────────────

    async fn active_slot(&self, slot_id: &str) -> DomainResult<ParkingSlot> {
        self.repos
            .slots()
            .find_by_id(slot_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", slot_id))
    }

    async fn try_create(
        &self,
        request: &BookingRequest,
        tariff: &Tariff,
    ) -> DomainResult<(Booking, Vec<Event>)> {
        // Maintenance may have been switched on since the pre-lock read.
        let slot = self.active_slot(&request.slot_id).await?;
        let ledger = self.repos.bookings().load_slot(&slot.id).await?;

        availability::check(
            &slot,
            &ledger.bookings,
            request.start_time,
            request.end_time,
            None,
        )
        .ensure_free(&slot.id)?;

        let now = self.clock.now();
        let Transition { booking, mut events } = self.machine.create(request, &slot, tariff, now)?;
        let version = self.repos.bookings().commit(ledger.version, &booking).await?;
        debug!(slot_id = %slot.id, version, "Booking committed");

        if let Some(change) = status_change(&slot, &ledger.bookings, &booking, now) {
            events.push(change);
        }
        Ok((booking, events))
    }

    /// Load, transition and commit one booking under its slot's lock.
    async fn mutate<F>(
        &self,
        booking_id: Uuid,
        slot_id: &str,
        operation: &'static str,
        apply: F,
    ) -> DomainResult<Booking>
    where
        F: Fn(&Booking, DateTime<Utc>) -> DomainResult<Transition> + Sync,
    {
        let guard = self.locks.acquire(slot_id).await?;
        let apply = &apply;
        let outcome = retry_with_backoff(
            &self.retry,
            operation,
            DomainError::is_transient,
            move |_| self.try_mutate(booking_id, slot_id, apply),
        )
        .await;
        drop(guard);

        let (booking, events, changed) = match outcome {
            Ok(done) => done,
            Err(e) => {
                debug!(booking_id = %booking_id, operation, error = %e, "Booking mutation failed");
                return Err(e.exhausted(slot_id));
            }
        };

        if changed {
            metrics::counter!("reservation_transitions_total", "to" => booking.status.as_str())
                .increment(1);
            info!(
                booking_id = %booking.id,
                slot_id = %booking.slot_id,
                operation,
                status = %booking.status,
                payment_status = %booking.payment_status,
                "Booking updated"
            );
        }
        self.publish(events);
        Ok(booking)
    }

    async fn try_mutate<F>(
        &self,
        booking_id: Uuid,
        slot_id: &str,
        apply: &F,
    ) -> DomainResult<(Booking, Vec<Event>, bool)>
    where
        F: Fn(&Booking, DateTime<Utc>) -> DomainResult<Transition> + Sync,
    {
        let ledger = self.repos.bookings().load_slot(slot_id).await?;
        let current = self.get_booking(booking_id).await?;

        let now = self.clock.now();
        let Transition { booking, mut events } = apply(&current, now)?;
        if booking == current {
            return Ok((booking, events, false));
        }

        let version = self.repos.bookings().commit(ledger.version, &booking).await?;
        debug!(slot_id, version, booking_id = %booking_id, "Booking committed");

        if let Some(slot) = self.repos.slots().find_by_id(slot_id).await? {
            if let Some(change) = status_change(&slot, &ledger.bookings, &booking, now) {
                events.push(change);
            }
        }
        Ok((booking, events, true))
    }

    fn publish(&self, events: Vec<Event>) {
        for event in &events {
            debug!(
                event_type = event.event_type(),
                booking_id = ?event.booking_id(),
                slot_id = event.slot_id(),
                "Publishing event"
            );
        }
        self.events.publish_all(events);
    }
}

/// `SlotStatusChanged` if writing `updated` into `before` moves the slot's
/// derived status.
fn status_change(
    slot: &ParkingSlot,
    before: &[Booking],
    updated: &Booking,
    now: DateTime<Utc>,
) -> Option<Event> {
    let previous = slot.derive_status(before, now);

    let mut after: Vec<Booking> = before
        .iter()
        .filter(|b| b.id != updated.id)
        .cloned()
        .collect();
    after.push(updated.clone());
    let current = slot.derive_status(&after, now);

    (previous != current).then(|| {
        Event::SlotStatusChanged(SlotStatusChangedEvent {
            slot_id: slot.id.clone(),
            previous,
            current,
        })
    })
}

// ── Tests ──────────────────────────────────────────────────────
