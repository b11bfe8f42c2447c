//! SeaORM implementation of SlotRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use super::{corrupt, db_err};
use crate::domain::slot::{ParkingSlot, SlotCategory, SlotRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::parking_slot;
use crate::shared::errors::DomainError;

pub struct SeaOrmSlotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: &str) -> DomainResult<parking_slot::Model> {
        parking_slot::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", id))
    }
}

fn model_to_domain(m: parking_slot::Model) -> DomainResult<ParkingSlot> {
    let category = SlotCategory::parse(&m.category)
        .ok_or_else(|| corrupt("ParkingSlot", "category", &m.category))?;
    Ok(ParkingSlot {
        id: m.id,
        parking_id: m.parking_id,
        category,
        maintenance: m.maintenance,
        is_active: m.is_active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

#[async_trait]
impl SlotRepository for SeaOrmSlotRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSlot>> {
        parking_slot::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_parking(&self, parking_id: &str) -> DomainResult<Vec<ParkingSlot>> {
        parking_slot::Entity::find()
            .filter(parking_slot::Column::ParkingId.eq(parking_id))
            .order_by_asc(parking_slot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn save(&self, slot: ParkingSlot) -> DomainResult<()> {
        debug!(slot_id = %slot.id, "Saving parking slot");

        let model = parking_slot::ActiveModel {
            id: Set(slot.id),
            parking_id: Set(slot.parking_id),
            category: Set(slot.category.as_str().to_string()),
            maintenance: Set(slot.maintenance),
            is_active: Set(slot.is_active),
            created_at: Set(slot.created_at),
            updated_at: Set(slot.updated_at),
        };
        parking_slot::Entity::insert(model)
            .on_conflict(
                OnConflict::column(parking_slot::Column::Id)
                    .update_columns([
                        parking_slot::Column::ParkingId,
                        parking_slot::Column::Category,
                        parking_slot::Column::Maintenance,
                        parking_slot::Column::IsActive,
                        parking_slot::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_maintenance(&self, id: &str, maintenance: bool) -> DomainResult<()> {
        let mut active: parking_slot::ActiveModel = self.find_model(id).await?.into();
        active.maintenance = Set(maintenance);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn deactivate(&self, id: &str) -> DomainResult<()> {
        let mut active: parking_slot::ActiveModel = self.find_model(id).await?.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
