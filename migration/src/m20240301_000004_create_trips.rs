use sea_orm_migration::{prelude::*, schema::*};

use super::m20240301_000001_create_users::User;
use super::m20240301_000003_create_locations::Location;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trip::Table)
                    .if_not_exists()
                    .col(uuid(Trip::Id).primary_key())
                    .col(uuid(Trip::DriverId).not_null())
                    .col(integer(Trip::StartLocationId).not_null())
                    .col(integer(Trip::EndLocationId).not_null())
                    .col(timestamp_with_time_zone(Trip::DepartureTime).not_null())
                    .col(
                        integer(Trip::TotalSeats)
                            .not_null()
                            .check(Expr::col(Trip::TotalSeats).gte(1)),
                    )
                    .col(
                        integer(Trip::AvailableSeats)
                            .not_null()
                            .check(Expr::col(Trip::AvailableSeats).gte(0)),
                    )
                    .col(double(Trip::PricePerSeat).not_null())
                    .col(
                        timestamp_with_time_zone(Trip::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Trip::AvailableSeats).lte(Expr::col(Trip::TotalSeats)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_driver")
                            .from(Trip::Table, Trip::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_start_location")
                            .from(Trip::Table, Trip::StartLocationId)
                            .to(Location::Table, Location::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_end_location")
                            .from(Trip::Table, Trip::EndLocationId)
                            .to(Location::Table, Location::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trip_driver_departure")
                    .table(Trip::Table)
                    .col(Trip::DriverId)
                    .col(Trip::DepartureTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trip::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Trip {
    Table,
    Id,
    DriverId,
    StartLocationId,
    EndLocationId,
    DepartureTime,
    TotalSeats,
    AvailableSeats,
    PricePerSeat,
    CreatedAt,
}
