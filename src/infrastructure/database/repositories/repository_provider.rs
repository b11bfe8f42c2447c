//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::slot::SlotRepository;
use crate::domain::tariff::TariffRepository;

use super::booking_repository::SeaOrmBookingRepository;
use super::slot_repository::SeaOrmSlotRepository;
use super::tariff_repository::SeaOrmTariffRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let slot = repos.slots().find_by_id("A-01").await?;
/// let ledger = repos.bookings().load_slot("A-01").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    slots: SeaOrmSlotRepository,
    tariffs: SeaOrmTariffRepository,
    bookings: SeaOrmBookingRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            slots: SeaOrmSlotRepository::new(db.clone()),
            tariffs: SeaOrmTariffRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn slots(&self) -> &dyn SlotRepository {
        &self.slots
    }

    fn tariffs(&self) -> &dyn TariffRepository {
        &self.tariffs
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }
}
