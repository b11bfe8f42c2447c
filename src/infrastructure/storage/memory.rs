//! In-memory storage implementation
//!
//! Backs every repository with `DashMap`s. Each slot owns a ledger holding
//! its bookings and version; a commit checks and bumps the version while
//! holding the ledger's map entry, so the compare-and-set is atomic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingRepository, BookingStatus, SlotBookings};
use crate::domain::slot::{ParkingSlot, SlotRepository};
use crate::domain::tariff::{Tariff, TariffRepository};
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::errors::DomainError;

#[derive(Debug, Default)]
struct SlotLedger {
    version: i64,
    bookings: BTreeMap<Uuid, Booking>,
}

/// In-memory storage for development and testing
pub struct InMemoryRepositoryProvider {
    slots: DashMap<String, ParkingSlot>,
    tariffs: DashMap<i32, Tariff>,
    ledgers: DashMap<String, SlotLedger>,
    /// booking id → slot id
    booking_index: DashMap<Uuid, String>,
    tariff_counter: AtomicI32,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            tariffs: DashMap::new(),
            ledgers: DashMap::new(),
            booking_index: DashMap::new(),
            tariff_counter: AtomicI32::new(1),
        }
    }

    /// Seed a slot without going through the async registry
    pub fn insert_slot(&self, slot: ParkingSlot) {
        self.slots.insert(slot.id.clone(), slot);
    }

    /// Seed a tariff under its own id, skipping `Tariff::validate`
    pub fn insert_tariff(&self, tariff: Tariff) {
        self.tariff_counter.fetch_max(tariff.id + 1, Ordering::SeqCst);
        self.tariffs.insert(tariff.id, tariff);
    }

    pub fn booking_count(&self) -> usize {
        self.booking_index.len()
    }

    fn all_bookings(&self) -> Vec<Booking> {
        self.ledgers
            .iter()
            .flat_map(|ledger| ledger.bookings.values().cloned().collect::<Vec<_>>())
            .collect()
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn slots(&self) -> &dyn SlotRepository {
        self
    }

    fn tariffs(&self) -> &dyn TariffRepository {
        self
    }

    fn bookings(&self) -> &dyn BookingRepository {
        self
    }
}

#[async_trait]
impl SlotRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSlot>> {
        Ok(self.slots.get(id).map(|s| s.clone()))
    }

    async fn find_by_parking(&self, parking_id: &str) -> DomainResult<Vec<ParkingSlot>> {
        let mut slots: Vec<_> = self
            .slots
            .iter()
            .filter(|s| s.parking_id == parking_id)
            .map(|s| s.value().clone())
            .collect();
        slots.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(slots)
    }

    async fn save(&self, slot: ParkingSlot) -> DomainResult<()> {
        self.slots.insert(slot.id.clone(), slot);
        Ok(())
    }

    async fn set_maintenance(&self, id: &str, maintenance: bool) -> DomainResult<()> {
        let mut slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", id))?;
        slot.maintenance = maintenance;
        slot.updated_at = Utc::now();
        Ok(())
    }

    async fn deactivate(&self, id: &str) -> DomainResult<()> {
        let mut slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", id))?;
        slot.is_active = false;
        slot.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl TariffRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>> {
        Ok(self.tariffs.get(&id).map(|t| t.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Tariff>> {
        let mut tariffs: Vec<_> = self.tariffs.iter().map(|t| t.value().clone()).collect();
        tariffs.sort_by_key(|t| t.id);
        Ok(tariffs)
    }

    async fn save(&self, mut tariff: Tariff) -> DomainResult<Tariff> {
        tariff.validate()?;
        if tariff.id == 0 {
            tariff.id = self.tariff_counter.fetch_add(1, Ordering::SeqCst);
        } else {
            self.tariff_counter.fetch_max(tariff.id + 1, Ordering::SeqCst);
        }
        self.tariffs.insert(tariff.id, tariff.clone());
        Ok(tariff)
    }

    async fn deactivate(&self, id: i32) -> DomainResult<()> {
        let mut tariff = self
            .tariffs
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Tariff", "id", id))?;
        tariff.is_active = false;
        tariff.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        let Some(slot_id) = self.booking_index.get(&id).map(|s| s.clone()) else {
            return Ok(None);
        };
        Ok(self
            .ledgers
            .get(&slot_id)
            .and_then(|ledger| ledger.bookings.get(&id).cloned()))
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<Booking>> {
        let mut bookings: Vec<_> = self
            .all_bookings()
            .into_iter()
            .filter(|b| b.user_id == user_id)
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn load_slot(&self, slot_id: &str) -> DomainResult<SlotBookings> {
        let Some(ledger) = self.ledgers.get(slot_id) else {
            return Ok(SlotBookings {
                slot_id: slot_id.to_string(),
                ..Default::default()
            });
        };
        let mut bookings: Vec<_> = ledger
            .bookings
            .values()
            .filter(|b| b.is_live())
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(SlotBookings {
            slot_id: slot_id.to_string(),
            version: ledger.version,
            bookings,
        })
    }

    async fn commit(&self, expected_version: i64, booking: &Booking) -> DomainResult<i64> {
        let mut ledger = self.ledgers.entry(booking.slot_id.clone()).or_default();
        if ledger.version != expected_version {
            return Err(DomainError::StaleVersion {
                slot_id: booking.slot_id.clone(),
                expected: expected_version,
                actual: ledger.version,
            });
        }

        ledger.version += 1;
        ledger.bookings.insert(booking.id, booking.clone());
        self.booking_index
            .insert(booking.id, booking.slot_id.clone());
        Ok(ledger.version)
    }

    async fn find_pending_started(&self, now: DateTime<Utc>) -> DomainResult<Vec<Booking>> {
        let mut bookings: Vec<_> = self
            .all_bookings()
            .into_iter()
            .filter(|b| b.status == BookingStatus::Pending && b.start_time <= now)
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reservation::{BookingRequest, BookingStateMachine};
    use crate::domain::slot::SlotCategory;
    use crate::domain::tariff::TariffUnit;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, 0, 0).unwrap()
    }

    fn booking(user: &str, start: u32, end: u32) -> Booking {
        let slot = ParkingSlot::new("S1", "P1", SlotCategory::Standard);
        let tariff = Tariff::new(1, "Hourly", TariffUnit::Hourly, Decimal::ONE, "EUR");
        let request = BookingRequest {
            user_id: user.into(),
            slot_id: "S1".into(),
            start_time: at(start),
            end_time: at(end),
            tariff_id: 1,
            vehicle_id: None,
        };
        BookingStateMachine::default()
            .create(&request, &slot, &tariff, at(start.min(8)))
            .unwrap()
            .booking
    }

    #[tokio::test]
    async fn commit_bumps_version() {
        let store = InMemoryRepositoryProvider::new();
        let b = booking("U1", 9, 10);
        assert_eq!(store.bookings().commit(0, &b).await.unwrap(), 1);

        let ledger = store.bookings().load_slot("S1").await.unwrap();
        assert_eq!(ledger.version, 1);
        assert_eq!(ledger.bookings, vec![b.clone()]);
        assert_eq!(store.bookings().find_by_id(b.id).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn stale_commit_is_rejected_without_writing() {
        let store = InMemoryRepositoryProvider::new();
        store.bookings().commit(0, &booking("U1", 9, 10)).await.unwrap();

        let late = booking("U2", 9, 10);
        let err = store.bookings().commit(0, &late).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::StaleVersion { expected: 0, actual: 1, .. }
        ));
        assert_eq!(store.bookings().find_by_id(late.id).await.unwrap(), None);
        assert_eq!(store.booking_count(), 1);
    }

    #[tokio::test]
    async fn load_slot_hides_terminal_bookings() {
        let store = InMemoryRepositoryProvider::new();
        let mut b = booking("U1", 9, 10);
        store.bookings().commit(0, &b).await.unwrap();
        b.status = BookingStatus::Cancelled;
        store.bookings().commit(1, &b).await.unwrap();

        let ledger = store.bookings().load_slot("S1").await.unwrap();
        assert_eq!(ledger.version, 2);
        assert!(ledger.bookings.is_empty());
        assert_eq!(
            store.bookings().find_by_id(b.id).await.unwrap().map(|b| b.status),
            Some(BookingStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn unknown_slot_loads_empty_at_version_zero() {
        let store = InMemoryRepositoryProvider::new();
        let ledger = store.bookings().load_slot("nope").await.unwrap();
        assert_eq!(ledger.version, 0);
        assert!(ledger.bookings.is_empty());
    }

    #[tokio::test]
    async fn pending_started_filters_by_start_and_status() {
        let store = InMemoryRepositoryProvider::new();
        let early = booking("U1", 9, 10);
        let late = booking("U1", 12, 13);
        store.bookings().commit(0, &early).await.unwrap();
        store.bookings().commit(1, &late).await.unwrap();

        let started = store.bookings().find_pending_started(at(9)).await.unwrap();
        assert_eq!(started.iter().map(|b| b.id).collect::<Vec<_>>(), vec![early.id]);
    }

    #[tokio::test]
    async fn tariff_save_assigns_ids_after_seeds() {
        let store = InMemoryRepositoryProvider::new();
        store.insert_tariff(Tariff::new(5, "Seed", TariffUnit::Daily, Decimal::ONE, "EUR"));
        let saved = store
            .tariffs()
            .save(Tariff::new(0, "New", TariffUnit::Hourly, Decimal::ONE, "EUR"))
            .await
            .unwrap();
        assert_eq!(saved.id, 6);

        store.tariffs().deactivate(6).await.unwrap();
        assert!(!store.tariffs().find_by_id(6).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn slot_registry_orders_and_flags() {
        let store = InMemoryRepositoryProvider::new();
        for id in ["B", "A"] {
            store.insert_slot(ParkingSlot::new(id, "P1", SlotCategory::Standard));
        }
        store.insert_slot(ParkingSlot::new("C", "P2", SlotCategory::Electric));

        let ids: Vec<_> = store
            .slots()
            .find_by_parking("P1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["A", "B"]);

        store.slots().set_maintenance("A", true).await.unwrap();
        assert!(store.slots().find_by_id("A").await.unwrap().unwrap().maintenance);
        assert!(matches!(
            store.slots().deactivate("zzz").await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
