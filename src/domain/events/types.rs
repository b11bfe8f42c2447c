//! Event definitions
//!
//! Lifecycle events (`booking_*`, `slot_status_changed`) are consumed by the
//! notification/support side; intents (`charge_requested`,
//! `refund_requested`) are consumed by the balance service. The engine
//! never moves money itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::booking::Booking;
use crate::domain::slot::SlotStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    BookingCreated(BookingEvent),
    BookingActivated(BookingEvent),
    BookingCancelled(BookingCancelledEvent),
    BookingCompleted(BookingCompletedEvent),
    ChargeRequested(PaymentIntent),
    RefundRequested(PaymentIntent),
    SlotStatusChanged(SlotStatusChangedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BookingCreated(_) => "booking_created",
            Event::BookingActivated(_) => "booking_activated",
            Event::BookingCancelled(_) => "booking_cancelled",
            Event::BookingCompleted(_) => "booking_completed",
            Event::ChargeRequested(_) => "charge_requested",
            Event::RefundRequested(_) => "refund_requested",
            Event::SlotStatusChanged(_) => "slot_status_changed",
        }
    }

    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            Event::BookingCreated(e) | Event::BookingActivated(e) => Some(e.booking_id),
            Event::BookingCancelled(e) => Some(e.booking_id),
            Event::BookingCompleted(e) => Some(e.booking_id),
            Event::ChargeRequested(e) | Event::RefundRequested(e) => Some(e.booking_id),
            Event::SlotStatusChanged(_) => None,
        }
    }

    pub fn slot_id(&self) -> &str {
        match self {
            Event::BookingCreated(e) | Event::BookingActivated(e) => &e.slot_id,
            Event::BookingCancelled(e) => &e.slot_id,
            Event::BookingCompleted(e) => &e.slot_id,
            Event::ChargeRequested(e) | Event::RefundRequested(e) => &e.slot_id,
            Event::SlotStatusChanged(e) => &e.slot_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub user_id: String,
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price: Decimal,
}

impl From<&Booking> for BookingEvent {
    fn from(b: &Booking) -> Self {
        Self {
            booking_id: b.id,
            user_id: b.user_id.clone(),
            slot_id: b.slot_id.clone(),
            start_time: b.start_time,
            end_time: b.end_time,
            total_price: b.total_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub user_id: String,
    pub slot_id: String,
    pub cancelled_by: String,
    /// Whether an override (administrator or no-show sweep) was used
    pub is_override: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCompletedEvent {
    pub booking_id: Uuid,
    pub user_id: String,
    pub slot_id: String,
    pub actual_end_time: DateTime<Utc>,
    pub final_price: Decimal,
    pub refund_due: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub booking_id: Uuid,
    pub user_id: String,
    pub slot_id: String,
    pub amount: Decimal,
    pub currency: String,
}

impl PaymentIntent {
    pub fn for_booking(b: &Booking, amount: Decimal) -> Self {
        Self {
            booking_id: b.id,
            user_id: b.user_id.clone(),
            slot_id: b.slot_id.clone(),
            amount,
            currency: b.tariff.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotStatusChangedEvent {
    pub slot_id: String,
    pub previous: SlotStatus,
    pub current: SlotStatus,
}

/// Event envelope with a unique id and publication time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
