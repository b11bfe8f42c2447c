//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod repository_provider;
pub mod slot_repository;
pub mod tariff_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

// ── Conversion helpers shared by the repositories ───────────────

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

/// Amount in minor units (cents), rounded half-up to two places
pub(crate) fn to_minor_units(amount: Decimal) -> DomainResult<i64> {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    i64::try_from(rounded.mantissa())
        .map_err(|_| DomainError::InvalidRecord(format!("amount {amount} does not fit in minor units")))
}

pub(crate) fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

pub(crate) fn corrupt(entity: &str, field: &str, value: &str) -> DomainError {
    DomainError::InvalidRecord(format!("{entity} has unreadable {field} '{value}'"))
}
