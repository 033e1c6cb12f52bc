//! In-memory repositories for service tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use uuid::Uuid;

use super::{
    LocationRepository, NewTrip, NewUser, NewVehicle, TripDetails, TripRepository,
    UserRepository, VehicleRepository,
};
use crate::entities::{location, trip, user, vehicle};

#[derive(Default)]
struct Tables {
    users: Vec<user::Model>,
    vehicles: Vec<vehicle::Model>,
    locations: Vec<location::Model>,
    trips: Vec<trip::Model>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    fail_trip_queries: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every trip query and insert returns a connection error.
    pub fn failing_trips() -> Self {
        Self {
            fail_trip_queries: true,
            ..Self::default()
        }
    }

    pub fn location_count(&self) -> usize {
        self.tables.lock().unwrap().locations.len()
    }

    pub fn add_location(&self, latitude: f64, longitude: f64, city: &str) -> location::Model {
        let mut tables = self.tables.lock().unwrap();
        let model = location::Model {
            id: tables.locations.len() as i32 + 1,
            latitude,
            longitude,
            city: city.to_string(),
        };
        tables.locations.push(model.clone());
        model
    }

    fn details(tables: &Tables, t: &trip::Model, with_driver: bool) -> Option<TripDetails> {
        let find = |id: i32| tables.locations.iter().find(|l| l.id == id).cloned();
        Some(TripDetails {
            trip: t.clone(),
            driver: with_driver
                .then(|| tables.users.iter().find(|u| u.id == t.driver_id).cloned())
                .flatten(),
            start_location: find(t.start_location_id)?,
            end_location: find(t.end_location_id)?,
        })
    }

    fn check_trips(&self) -> Result<(), DbErr> {
        if self.fail_trip_queries {
            return Err(DbErr::Custom("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<user::Model>, DbErr> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<user::Model, DbErr> {
        let model = user::Model {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            created_at: Utc::now().into(),
        };
        self.tables.lock().unwrap().users.push(model.clone());
        Ok(model)
    }
}

#[async_trait]
impl VehicleRepository for InMemoryRepository {
    async fn has_vehicle(&self, driver_id: Uuid) -> Result<bool, DbErr> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.vehicles.iter().any(|v| v.driver_id == driver_id))
    }

    async fn vehicles_for_driver(&self, driver_id: Uuid) -> Result<Vec<vehicle::Model>, DbErr> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .vehicles
            .iter()
            .filter(|v| v.driver_id == driver_id)
            .cloned()
            .collect())
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<vehicle::Model>, DbErr> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .vehicles
            .iter()
            .find(|v| v.license_plate == plate)
            .cloned())
    }

    async fn create_vehicle(&self, new_vehicle: NewVehicle) -> Result<vehicle::Model, DbErr> {
        let model = vehicle::Model {
            id: Uuid::new_v4(),
            driver_id: new_vehicle.driver_id,
            make: new_vehicle.make,
            model: new_vehicle.model,
            license_plate: new_vehicle.license_plate,
            color: new_vehicle.color,
            created_at: Utc::now().into(),
        };
        self.tables.lock().unwrap().vehicles.push(model.clone());
        Ok(model)
    }
}

#[async_trait]
impl LocationRepository for InMemoryRepository {
    async fn find_by_coordinate(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<location::Model>, DbErr> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .locations
            .iter()
            .find(|l| l.latitude == latitude && l.longitude == longitude)
            .cloned())
    }

    async fn insert_if_absent(
        &self,
        latitude: f64,
        longitude: f64,
        city: &str,
    ) -> Result<(), DbErr> {
        let mut tables = self.tables.lock().unwrap();
        let exists = tables
            .locations
            .iter()
            .any(|l| l.latitude == latitude && l.longitude == longitude);
        if !exists {
            let id = tables.locations.len() as i32 + 1;
            tables.locations.push(location::Model {
                id,
                latitude,
                longitude,
                city: city.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TripRepository for InMemoryRepository {
    async fn planned_trips_for_driver(
        &self,
        driver_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<TripDetails>, DbErr> {
        self.check_trips()?;
        let tables = self.tables.lock().unwrap();
        let mut trips: Vec<&trip::Model> = tables
            .trips
            .iter()
            .filter(|t| t.driver_id == driver_id && t.departure_time > after)
            .collect();
        trips.sort_by_key(|t| (t.departure_time, t.id));
        Ok(trips
            .into_iter()
            .filter_map(|t| Self::details(&tables, t, false))
            .collect())
    }

    async fn trips_by_city_pair(
        &self,
        start_city: &str,
        end_city: &str,
    ) -> Result<Vec<TripDetails>, DbErr> {
        self.check_trips()?;
        let tables = self.tables.lock().unwrap();
        let mut details: Vec<TripDetails> = tables
            .trips
            .iter()
            .filter_map(|t| Self::details(&tables, t, true))
            .filter(|d| d.start_location.city == start_city && d.end_location.city == end_city)
            .collect();
        details.sort_by_key(|d| (d.trip.departure_time, d.trip.id));
        Ok(details)
    }

    async fn insert_trip(&self, new_trip: NewTrip) -> Result<trip::Model, DbErr> {
        self.check_trips()?;
        let model = trip::Model {
            id: Uuid::new_v4(),
            driver_id: new_trip.driver_id,
            start_location_id: new_trip.start_location_id,
            end_location_id: new_trip.end_location_id,
            departure_time: new_trip.departure_time.into(),
            total_seats: new_trip.total_seats,
            available_seats: new_trip.available_seats,
            price_per_seat: new_trip.price_per_seat,
            created_at: Utc::now().into(),
        };
        self.tables.lock().unwrap().trips.push(model.clone());
        Ok(model)
    }
}
