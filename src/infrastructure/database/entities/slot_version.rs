//! Per-slot version token used for optimistic commits

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "slot_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub slot_id: String,

    /// Incremented on every committed booking write for the slot
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
