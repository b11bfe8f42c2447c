//! Availability calculator
//!
//! Intervals are half-open: `[s1, e1)` and `[s2, e2)` overlap iff
//! `s1 < e2 && s2 < e1`, so back-to-back bookings never conflict. Only
//! pending and active bookings hold a slot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::booking::Booking;
use crate::domain::slot::ParkingSlot;
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Free,
    /// Overlaps this live booking
    Conflict(Uuid),
    Maintenance,
}

impl Availability {
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    /// `SlotConflict` unless free
    pub fn ensure_free(self, slot_id: &str) -> DomainResult<()> {
        match self {
            Self::Free => Ok(()),
            Self::Conflict(id) => Err(DomainError::SlotConflict {
                slot_id: slot_id.to_string(),
                conflicting: Some(id),
            }),
            Self::Maintenance => Err(DomainError::SlotConflict {
                slot_id: slot_id.to_string(),
                conflicting: None,
            }),
        }
    }
}

/// Check `[start, end)` on `slot` against `bookings`, ignoring `excluding`.
///
/// Pure: callers decide which snapshot of bookings to pass in.
pub fn check(
    slot: &ParkingSlot,
    bookings: &[Booking],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    excluding: Option<Uuid>,
) -> Availability {
    if slot.maintenance {
        return Availability::Maintenance;
    }

    bookings
        .iter()
        .filter(|b| b.slot_id == slot.id && b.is_live())
        .filter(|b| Some(b.id) != excluding)
        .find(|b| b.overlaps(start, end))
        .map_or(Availability::Free, |b| Availability::Conflict(b.id))
}

/// Repository-backed availability queries. Lock-free; every call reads a
/// fresh snapshot.
pub struct AvailabilityCalculator {
    repos: Arc<dyn RepositoryProvider>,
}

impl AvailabilityCalculator {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn is_available(
        &self,
        slot_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> DomainResult<bool> {
        Booking::validate_interval(start, end)?;
        let slot = self
            .repos
            .slots()
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", slot_id))?;
        let ledger = self.repos.bookings().load_slot(slot_id).await?;
        Ok(check(&slot, &ledger.bookings, start, end, excluding).is_free())
    }

    /// Ids of the active slots of `parking_id` free for the whole window,
    /// in slot id order.
    pub async fn available_slots(
        &self,
        parking_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<String>> {
        Booking::validate_interval(start, end)?;
        let slots = self.repos.slots().find_by_parking(parking_id).await?;

        let mut available = Vec::new();
        for slot in slots.into_iter().filter(|s| s.is_active) {
            let ledger = self.repos.bookings().load_slot(&slot.id).await?;
            if check(&slot, &ledger.bookings, start, end, None).is_free() {
                available.push(slot.id);
            }
        }
        available.sort();
        Ok(available)
    }
}

// ── Tests ──────────────────────────────────────────────────────
