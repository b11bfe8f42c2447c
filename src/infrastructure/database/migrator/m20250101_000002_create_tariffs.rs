//! Create tariffs table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tariffs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tariffs::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tariffs::Name).string().not_null())
                    .col(ColumnDef::new(Tariffs::ParkingId).string())
                    .col(
                        ColumnDef::new(Tariffs::Unit)
                            .string_len(16)
                            .not_null()
                            .default("hourly"),
                    )
                    .col(
                        ColumnDef::new(Tariffs::UnitPrice)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tariffs::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EUR"),
                    )
                    .col(
                        ColumnDef::new(Tariffs::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Tariffs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tariffs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tariffs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Tariffs {
    Table,
    Id,
    Name,
    ParkingId,
    Unit,
    UnitPrice,
    Currency,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
