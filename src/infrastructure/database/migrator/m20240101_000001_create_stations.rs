//! Create stations table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Stations::Name).string().not_null())
                    .col(ColumnDef::new(Stations::Address).string().not_null())
                    .col(ColumnDef::new(Stations::City).string().not_null())
                    .col(ColumnDef::new(Stations::District).string().not_null())
                    .col(ColumnDef::new(Stations::Latitude).double().not_null())
                    .col(ColumnDef::new(Stations::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Stations::StationType)
                            .string()
                            .not_null()
                            .default("AC"),
                    )
                    .col(ColumnDef::new(Stations::TotalSlots).integer().not_null())
                    .col(ColumnDef::new(Stations::AvailableSlots).integer().not_null())
                    .col(
                        ColumnDef::new(Stations::OpenTime)
                            .string()
                            .not_null()
                            .default("00:00:00"),
                    )
                    .col(
                        ColumnDef::new(Stations::CloseTime)
                            .string()
                            .not_null()
                            .default("00:00:00"),
                    )
                    .col(
                        ColumnDef::new(Stations::IsOpen24Hours)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Stations::Status)
                            .string()
                            .not_null()
                            .default("Active"),
                    )
                    .col(ColumnDef::new(Stations::OperatorId).string().not_null())
                    .col(
                        ColumnDef::new(Stations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Stations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stations_status")
                    .table(Stations::Table)
                    .col(Stations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stations_operator")
                    .table(Stations::Table)
                    .col(Stations::OperatorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Stations {
    Table,
    Id,
    Name,
    Address,
    City,
    District,
    Latitude,
    Longitude,
    StationType,
    TotalSlots,
    AvailableSlots,
    OpenTime,
    CloseTime,
    #[iden = "is_open_24_hours"]
    IsOpen24Hours,
    Status,
    OperatorId,
    CreatedAt,
    UpdatedAt,
}
