use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Location::Table)
                    .if_not_exists()
                    .col(pk_auto(Location::Id))
                    .col(double(Location::Latitude).not_null())
                    .col(double(Location::Longitude).not_null())
                    .col(string_len(Location::City, 100).not_null())
                    .to_owned(),
            )
            .await?;

        // One row per coordinate; find-or-create relies on this constraint.
        manager
            .create_index(
                Index::create()
                    .name("uq_location_coordinate")
                    .table(Location::Table)
                    .col(Location::Latitude)
                    .col(Location::Longitude)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_location_city")
                    .table(Location::Table)
                    .col(Location::City)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Location::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Location {
    Table,
    Id,
    Latitude,
    Longitude,
    City,
}
