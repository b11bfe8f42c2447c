//! Booking entity
//!
//! The tariff terms quoted at creation are stored inline so later tariff
//! edits never touch existing bookings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,
    pub parking_id: String,
    pub slot_id: String,

    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,

    #[sea_orm(nullable)]
    pub actual_end_time: Option<DateTimeUtc>,

    /// pending, active, completed, cancelled
    pub status: String,

    /// pending, paid, refunded
    pub payment_status: String,

    // Money columns hold minor units (cents)
    pub total_price: i64,
    #[sea_orm(nullable)]
    pub final_price: Option<i64>,
    pub refund_due: i64,

    pub tariff_id: i32,
    pub tariff_unit: String,
    pub tariff_unit_price: i64,
    pub currency: String,

    #[sea_orm(nullable)]
    pub vehicle_id: Option<String>,

    #[sea_orm(nullable)]
    pub access_token: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_slot::Entity",
        from = "Column::SlotId",
        to = "super::parking_slot::Column::Id"
    )]
    ParkingSlot,
}

impl Related<super::parking_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingSlot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
