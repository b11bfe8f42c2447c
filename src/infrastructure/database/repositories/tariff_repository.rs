//! SeaORM implementation of TariffRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set,
};
use tracing::info;

use super::{db_err, from_minor_units, to_minor_units};
use crate::domain::tariff::{Tariff, TariffRepository, TariffUnit};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::tariff;
use crate::shared::errors::DomainError;

// ── Conversion helpers ──────────────────────────────────────────

fn unit_to_entity(unit: TariffUnit) -> tariff::TariffUnit {
    match unit {
        TariffUnit::Hourly => tariff::TariffUnit::Hourly,
        TariffUnit::Daily => tariff::TariffUnit::Daily,
        TariffUnit::Weekly => tariff::TariffUnit::Weekly,
        TariffUnit::Monthly => tariff::TariffUnit::Monthly,
    }
}

fn entity_to_domain(t: tariff::Model) -> Tariff {
    Tariff {
        id: t.id,
        name: t.name,
        parking_id: t.parking_id,
        unit: match t.unit {
            tariff::TariffUnit::Hourly => TariffUnit::Hourly,
            tariff::TariffUnit::Daily => TariffUnit::Daily,
            tariff::TariffUnit::Weekly => TariffUnit::Weekly,
            tariff::TariffUnit::Monthly => TariffUnit::Monthly,
        },
        unit_price: from_minor_units(t.unit_price),
        currency: t.currency,
        is_active: t.is_active,
        created_at: t.created_at,
        updated_at: t.updated_at,
    }
}

// ── SeaOrmTariffRepository ──────────────────────────────────────

pub struct SeaOrmTariffRepository {
    db: DatabaseConnection,
}

impl SeaOrmTariffRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn next_id(&self) -> DomainResult<i32> {
        let last = tariff::Entity::find()
            .order_by_desc(tariff::Column::Id)
            .limit(1)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(last.map_or(1, |t| t.id + 1))
    }
}

#[async_trait]
impl TariffRepository for SeaOrmTariffRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Tariff>> {
        let model = tariff::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Tariff>> {
        let models = tariff::Entity::find()
            .order_by_asc(tariff::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn save(&self, mut t: Tariff) -> DomainResult<Tariff> {
        t.validate()?;
        if t.id == 0 {
            t.id = self.next_id().await?;
        }

        let model = tariff::ActiveModel {
            id: Set(t.id),
            name: Set(t.name.clone()),
            parking_id: Set(t.parking_id.clone()),
            unit: Set(unit_to_entity(t.unit)),
            unit_price: Set(to_minor_units(t.unit_price)?),
            currency: Set(t.currency.clone()),
            is_active: Set(t.is_active),
            created_at: Set(t.created_at),
            updated_at: Set(t.updated_at),
        };
        tariff::Entity::insert(model)
            .on_conflict(
                OnConflict::column(tariff::Column::Id)
                    .update_columns([
                        tariff::Column::Name,
                        tariff::Column::ParkingId,
                        tariff::Column::Unit,
                        tariff::Column::UnitPrice,
                        tariff::Column::Currency,
                        tariff::Column::IsActive,
                        tariff::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        info!(
            tariff_id = t.id,
            name = %t.name,
            unit = %t.unit,
            unit_price = %t.unit_price,
            "Tariff saved"
        );
        Ok(t)
    }

    async fn deactivate(&self, id: i32) -> DomainResult<()> {
        let existing = tariff::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Tariff", "id", id))?;

        let mut active: tariff::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
