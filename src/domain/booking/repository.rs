//! Booking repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::Booking;
use crate::domain::DomainResult;

/// The live (pending/active) bookings of one slot together with the slot's
/// version token. The version grows by one on every committed write to any
/// booking of the slot.
#[derive(Debug, Clone, Default)]
pub struct SlotBookings {
    pub slot_id: String,
    pub version: i64,
    pub bookings: Vec<Booking>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>>;

    /// All bookings of a requester, newest first
    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<Booking>>;

    /// Consistent snapshot of a slot's live bookings and its version
    async fn load_slot(&self, slot_id: &str) -> DomainResult<SlotBookings>;

    /// Insert or replace `booking` iff its slot is still at `expected_version`.
    ///
    /// Fails with `DomainError::StaleVersion` when another writer got there
    /// first. Returns the new version only once the write is durable.
    async fn commit(&self, expected_version: i64, booking: &Booking) -> DomainResult<i64>;

    /// Pending bookings whose window started at or before `now`
    async fn find_pending_started(&self, now: DateTime<Utc>) -> DomainResult<Vec<Booking>>;
}
