use sea_orm_migration::{prelude::*, schema::*};

use super::m20240301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(uuid(Vehicle::DriverId).not_null())
                    .col(string_len(Vehicle::Make, 50).not_null())
                    .col(string_len(Vehicle::Model, 50).not_null())
                    .col(string_len(Vehicle::LicensePlate, 20).not_null().unique_key())
                    .col(string_len_null(Vehicle::Color, 30))
                    .col(
                        timestamp_with_time_zone(Vehicle::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_driver")
                            .from(Vehicle::Table, Vehicle::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicle_driver")
                    .table(Vehicle::Table)
                    .col(Vehicle::DriverId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    DriverId,
    Make,
    Model,
    LicensePlate,
    Color,
    CreatedAt,
}
