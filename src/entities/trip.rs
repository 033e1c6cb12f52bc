use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub driver_id: Uuid,
    pub start_location_id: i32,
    pub end_location_id: i32,
    pub departure_time: DateTimeWithTimeZone,
    pub total_seats: i32,
    pub available_seats: i32,
    pub price_per_seat: f64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id"
    )]
    Driver,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::StartLocationId",
        to = "super::location::Column::Id"
    )]
    StartLocation,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::EndLocationId",
        to = "super::location::Column::Id"
    )]
    EndLocation,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
