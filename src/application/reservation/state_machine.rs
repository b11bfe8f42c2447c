//! Booking state machine
//!
//! ```text
//!            ┌──────────► cancelled ◄──────────┐
//!            │ (requester before start,        │ (override)
//!            │  or override)                   │
//!   create ─► pending ──── activate ────► active ──── complete ──► completed
//! ```
//!
//! Every operation takes the current booking by reference and returns the
//! next state as a new value plus the events it implies. Nothing is written
//! here; the engine commits the returned booking atomically and publishes
//! the events afterwards. Terminal states (`completed`, `cancelled`) accept
//! no lifecycle transition.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::pricing::PricingEngine;
use crate::domain::booking::{Booking, BookingStatus, PaymentStatus};
use crate::domain::events::{
    BookingCancelledEvent, BookingCompletedEvent, BookingEvent, Event, PaymentIntent,
};
use crate::domain::slot::ParkingSlot;
use crate::domain::tariff::Tariff;
use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

/// Who is cancelling, as far as the guards are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAuthority {
    /// The owner: allowed only while pending and before the window starts
    Requester,
    /// Operator or administrator: allowed from any non-terminal state
    Override,
}

/// A booking in its next state together with the events to publish
#[derive(Debug, Clone)]
pub struct Transition {
    pub booking: Booking,
    pub events: Vec<Event>,
}

/// Fields supplied by the caller for a new booking
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: String,
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub tariff_id: i32,
    pub vehicle_id: Option<String>,
}

/// 32 random bytes, URL-safe base64 without padding
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn invalid(from: BookingStatus, action: &'static str) -> DomainError {
    DomainError::InvalidTransition { from, action }
}

#[derive(Debug, Clone, Default)]
pub struct BookingStateMachine {
    pricing: PricingEngine,
}

impl BookingStateMachine {
    pub fn new(pricing: PricingEngine) -> Self {
        Self { pricing }
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// New booking in `pending`, priced from `tariff`.
    ///
    /// Availability must already have been checked by the caller inside the
    /// slot's critical section.
    pub fn create(
        &self,
        request: &BookingRequest,
        slot: &ParkingSlot,
        tariff: &Tariff,
        now: DateTime<Utc>,
    ) -> DomainResult<Transition> {
        Booking::validate_interval(request.start_time, request.end_time)?;

        let terms = tariff.snapshot();
        let total_price = self
            .pricing
            .quote_duration(&terms, request.end_time - request.start_time);

        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            parking_id: slot.parking_id.clone(),
            slot_id: slot.id.clone(),
            start_time: request.start_time,
            end_time: request.end_time,
            actual_end_time: None,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_price,
            final_price: None,
            refund_due: Decimal::ZERO,
            tariff: terms,
            vehicle_id: request.vehicle_id.clone(),
            access_token: Some(generate_access_token()),
            created_at: now,
            updated_at: now,
        };

        let events = vec![
            Event::BookingCreated(BookingEvent::from(&booking)),
            Event::ChargeRequested(PaymentIntent::for_booking(&booking, total_price)),
        ];
        Ok(Transition { booking, events })
    }

    /// `pending → active` once the window has begun, or earlier on an
    /// explicit start-now confirmation. A window that is already over cannot
    /// be started.
    pub fn activate(
        &self,
        booking: &Booking,
        start_now: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Transition> {
        if booking.status != BookingStatus::Pending {
            return Err(invalid(booking.status, "activate"));
        }
        let window_open = booking.covers(now);
        let early_start = start_now && now < booking.end_time;
        if !window_open && !early_start {
            return Err(invalid(booking.status, "activate"));
        }

        let mut next = booking.clone();
        next.status = BookingStatus::Active;
        next.updated_at = now;

        let events = vec![Event::BookingActivated(BookingEvent::from(&next))];
        Ok(Transition {
            booking: next,
            events,
        })
    }

    pub fn cancel(
        &self,
        booking: &Booking,
        cancelled_by: &str,
        authority: CancelAuthority,
        now: DateTime<Utc>,
    ) -> DomainResult<Transition> {
        let allowed = match (booking.status, authority) {
            (BookingStatus::Pending, CancelAuthority::Requester) => now < booking.start_time,
            (BookingStatus::Pending | BookingStatus::Active, CancelAuthority::Override) => true,
            _ => false,
        };
        if !allowed {
            return Err(invalid(booking.status, "cancel"));
        }

        let mut next = booking.clone();
        next.status = BookingStatus::Cancelled;
        next.updated_at = now;

        let mut events = vec![Event::BookingCancelled(BookingCancelledEvent {
            booking_id: next.id,
            user_id: next.user_id.clone(),
            slot_id: next.slot_id.clone(),
            cancelled_by: cancelled_by.to_string(),
            is_override: authority == CancelAuthority::Override,
        })];

        if next.payment_status == PaymentStatus::Paid {
            next.payment_status = PaymentStatus::Refunded;
            next.refund_due = next.total_price;
            events.push(Event::RefundRequested(PaymentIntent::for_booking(
                &next,
                next.total_price,
            )));
        }

        Ok(Transition {
            booking: next,
            events,
        })
    }

    /// `active → completed`, reconciling the price against the actual stay.
    ///
    /// A `pending` booking whose window has started is activated implicitly.
    pub fn complete(
        &self,
        booking: &Booking,
        actual_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<Transition> {
        let mut events = Vec::new();
        let current = match booking.status {
            BookingStatus::Active => booking.clone(),
            BookingStatus::Pending if now >= booking.start_time => {
                let mut activated = booking.clone();
                activated.status = BookingStatus::Active;
                events.push(Event::BookingActivated(BookingEvent::from(&activated)));
                activated
            }
            status => return Err(invalid(status, "complete")),
        };

        if actual_end < current.start_time {
            return Err(DomainError::InvalidInterval(format!(
                "actual end {} is before start {}",
                actual_end.to_rfc3339(),
                current.start_time.to_rfc3339()
            )));
        }

        let reconciliation = self.pricing.reconcile(
            &current.tariff,
            current.total_price,
            current.planned_duration(),
            actual_end - current.start_time,
        );

        let mut next = current;
        next.status = BookingStatus::Completed;
        next.actual_end_time = Some(actual_end);
        next.final_price = Some(reconciliation.final_amount);
        next.refund_due = reconciliation.refund_due;
        next.updated_at = now;

        events.push(Event::BookingCompleted(BookingCompletedEvent {
            booking_id: next.id,
            user_id: next.user_id.clone(),
            slot_id: next.slot_id.clone(),
            actual_end_time: actual_end,
            final_price: reconciliation.final_amount,
            refund_due: reconciliation.refund_due,
        }));
        if next.payment_status == PaymentStatus::Paid && reconciliation.refund_due > Decimal::ZERO {
            events.push(Event::RefundRequested(PaymentIntent::for_booking(
                &next,
                reconciliation.refund_due,
            )));
        }
        if reconciliation.surcharge > Decimal::ZERO {
            events.push(Event::ChargeRequested(PaymentIntent::for_booking(
                &next,
                reconciliation.surcharge,
            )));
        }

        Ok(Transition {
            booking: next,
            events,
        })
    }

    /// Record the payment service's confirmation for the quoted charge.
    ///
    /// Only the payment status moves; the lifecycle state is untouched. A
    /// confirmation arriving after cancellation is refunded straight away,
    /// and one arriving after an early completion releases the flagged
    /// refund. Repeated confirmations are no-ops.
    pub fn confirm_payment(&self, booking: &Booking, now: DateTime<Utc>) -> DomainResult<Transition> {
        match booking.payment_status {
            PaymentStatus::Paid => {
                return Ok(Transition {
                    booking: booking.clone(),
                    events: Vec::new(),
                })
            }
            PaymentStatus::Refunded => return Err(invalid(booking.status, "confirm payment for")),
            PaymentStatus::Pending => {}
        }

        let mut next = booking.clone();
        next.payment_status = PaymentStatus::Paid;
        next.updated_at = now;
        let mut events = Vec::new();

        match next.status {
            BookingStatus::Cancelled => {
                next.payment_status = PaymentStatus::Refunded;
                next.refund_due = next.total_price;
                events.push(Event::RefundRequested(PaymentIntent::for_booking(
                    &next,
                    next.total_price,
                )));
            }
            BookingStatus::Completed if next.refund_due > Decimal::ZERO => {
                events.push(Event::RefundRequested(PaymentIntent::for_booking(
                    &next,
                    next.refund_due,
                )));
            }
            _ => {}
        }

        Ok(Transition {
            booking: next,
            events,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────
