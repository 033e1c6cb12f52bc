//! Storage seams used by the services.
//!
//! Each query shape the handlers need is a named method; the Postgres
//! implementation lives in [`crate::db::SeaOrmRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use uuid::Uuid;

use crate::entities::{location, trip, user, vehicle};

#[cfg(test)]
pub mod memory;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub driver_id: Uuid,
    pub make: String,
    pub model: String,
    pub license_plate: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub driver_id: Uuid,
    pub start_location_id: i32,
    pub end_location_id: i32,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub price_per_seat: f64,
}

/// A trip with its referenced rows loaded.
#[derive(Debug, Clone)]
pub struct TripDetails {
    pub trip: trip::Model,
    pub driver: Option<user::Model>,
    pub start_location: location::Model,
    pub end_location: location::Model,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<user::Model>, DbErr>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr>;

    async fn create_user(&self, new_user: NewUser) -> Result<user::Model, DbErr>;
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn has_vehicle(&self, driver_id: Uuid) -> Result<bool, DbErr>;

    async fn vehicles_for_driver(&self, driver_id: Uuid) -> Result<Vec<vehicle::Model>, DbErr>;

    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<vehicle::Model>, DbErr>;

    async fn create_vehicle(&self, new_vehicle: NewVehicle) -> Result<vehicle::Model, DbErr>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn find_by_coordinate(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<location::Model>, DbErr>;

    /// Inserts the location unless a row with the same coordinate exists.
    /// Never fails on a duplicate; callers re-read the canonical row.
    async fn insert_if_absent(
        &self,
        latitude: f64,
        longitude: f64,
        city: &str,
    ) -> Result<(), DbErr>;
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    /// Trips of `driver_id` departing strictly after `after`, earliest first.
    /// `driver` is left unset.
    async fn planned_trips_for_driver(
        &self,
        driver_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<TripDetails>, DbErr>;

    /// Trips whose start and end city names match exactly, earliest first.
    async fn trips_by_city_pair(
        &self,
        start_city: &str,
        end_city: &str,
    ) -> Result<Vec<TripDetails>, DbErr>;

    async fn insert_trip(&self, new_trip: NewTrip) -> Result<trip::Model, DbErr>;
}

pub type DynUserRepository = Arc<dyn UserRepository>;
pub type DynVehicleRepository = Arc<dyn VehicleRepository>;
pub type DynLocationRepository = Arc<dyn LocationRepository>;
pub type DynTripRepository = Arc<dyn TripRepository>;
