//! Tariff resolver
//!
//! Pure lookup: an absent, inactive, or foreign-site tariff is `NotFound`.
//! There is no fallback to a default tariff. Terms that cannot be priced
//! exactly are `InvalidTariff`.

use std::sync::Arc;

use tracing::debug;

use crate::domain::slot::ParkingSlot;
use crate::domain::tariff::Tariff;
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::errors::DomainError;

pub struct TariffResolver {
    repos: Arc<dyn RepositoryProvider>,
}

impl TariffResolver {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn resolve(&self, slot: &ParkingSlot, tariff_id: i32) -> DomainResult<Tariff> {
        let tariff = self
            .repos
            .tariffs()
            .find_by_id(tariff_id)
            .await?
            .filter(|t| t.applies_to(&slot.parking_id));

        match tariff {
            Some(t) => {
                t.validate()?;
                Ok(t)
            }
            None => {
                debug!(tariff_id, parking_id = %slot.parking_id, "Tariff not resolvable");
                Err(DomainError::not_found("Tariff", "id", tariff_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::slot::SlotCategory;
    use crate::domain::tariff::TariffUnit;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use rust_decimal::Decimal;

    fn setup() -> (TariffResolver, ParkingSlot) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        repos.insert_tariff(Tariff::new(1, "Standard", TariffUnit::Hourly, Decimal::new(1000, 2), "EUR"));
        repos.insert_tariff(
            Tariff::new(2, "Other site", TariffUnit::Daily, Decimal::new(3000, 2), "EUR")
                .for_parking("P2"),
        );
        let mut retired = Tariff::new(3, "Retired", TariffUnit::Hourly, Decimal::new(500, 2), "EUR");
        retired.is_active = false;
        repos.insert_tariff(retired);
        // Seeded behind the registry's back; saving it would be refused.
        repos.insert_tariff(Tariff::new(4, "Fraction", TariffUnit::Hourly, Decimal::new(125, 3), "EUR"));

        let slot = ParkingSlot::new("S1", "P1", SlotCategory::Standard);
        (TariffResolver::new(repos), slot)
    }

    #[tokio::test]
    async fn resolves_active_tariff() {
        let (resolver, slot) = setup();
        let t = resolver.resolve(&slot, 1).await.unwrap();
        assert_eq!(t.unit_price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn sub_cent_tariff_is_not_applied() {
        let (resolver, slot) = setup();
        assert!(matches!(
            resolver.resolve(&slot, 4).await,
            Err(DomainError::InvalidTariff(_))
        ));
    }

    #[tokio::test]
    async fn missing_inactive_and_foreign_are_not_found() {
        let (resolver, slot) = setup();
        for id in [2, 3, 99] {
            assert!(matches!(
                resolver.resolve(&slot, id).await,
                Err(DomainError::NotFound { entity: "Tariff", .. })
            ));
        }
    }
}
