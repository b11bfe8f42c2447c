//! Slot registry interface

use async_trait::async_trait;

use super::model::ParkingSlot;
use crate::domain::DomainResult;

#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSlot>>;

    /// Every slot of a parking site, including deactivated ones, ordered by id
    async fn find_by_parking(&self, parking_id: &str) -> DomainResult<Vec<ParkingSlot>>;

    /// Insert or replace
    async fn save(&self, slot: ParkingSlot) -> DomainResult<()>;

    async fn set_maintenance(&self, id: &str, maintenance: bool) -> DomainResult<()>;

    /// Soft-deactivate; slots referenced by bookings are never deleted
    async fn deactivate(&self, id: &str) -> DomainResult<()>;
}
