//! Tariff repository interface

use async_trait::async_trait;

use super::model::Tariff;
use crate::domain::DomainResult;

#[async_trait]
pub trait TariffRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>>;
    async fn find_all(&self) -> DomainResult<Vec<Tariff>>;
    /// Insert or replace. A tariff with `id == 0` gets the next free id.
    async fn save(&self, tariff: Tariff) -> DomainResult<Tariff>;
    /// Tariffs are never deleted, only switched off.
    async fn deactivate(&self, id: i32) -> DomainResult<()>;
}
