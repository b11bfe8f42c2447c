//! Create slot_versions table
//!
//! One row per slot that has ever had a booking. Booking writes update the
//! row conditionally on the version they read, which serializes writers
//! across processes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SlotVersions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SlotVersions::SlotId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SlotVersions::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SlotVersions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum SlotVersions {
    Table,
    SlotId,
    Version,
}
