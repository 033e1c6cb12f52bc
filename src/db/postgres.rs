use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
};
use uuid::Uuid;

use crate::entities::{location, trip, user, vehicle};
use crate::repository::{
    LocationRepository, NewTrip, NewUser, NewVehicle, TripDetails, TripRepository,
    UserRepository, VehicleRepository,
};

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load the locations (and optionally drivers) referenced by `trips`.
    async fn hydrate(
        &self,
        trips: Vec<trip::Model>,
        with_driver: bool,
    ) -> Result<Vec<TripDetails>, DbErr> {
        if trips.is_empty() {
            return Ok(Vec::new());
        }

        let location_ids: HashSet<i32> = trips
            .iter()
            .flat_map(|t| [t.start_location_id, t.end_location_id])
            .collect();
        let locations: HashMap<i32, location::Model> = location::Entity::find()
            .filter(location::Column::Id.is_in(location_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let drivers: HashMap<Uuid, user::Model> = if with_driver {
            let driver_ids: HashSet<Uuid> = trips.iter().map(|t| t.driver_id).collect();
            user::Entity::find()
                .filter(user::Column::Id.is_in(driver_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        } else {
            HashMap::new()
        };

        let details = trips
            .into_iter()
            .filter_map(|t| {
                let start = locations.get(&t.start_location_id)?;
                let end = locations.get(&t.end_location_id)?;
                Some(TripDetails {
                    driver: drivers.get(&t.driver_id).cloned(),
                    start_location: start.clone(),
                    end_location: end.clone(),
                    trip: t,
                })
            })
            .collect();

        Ok(details)
    }
}

#[async_trait]
impl UserRepository for SeaOrmRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id).one(&self.db).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }
}

#[async_trait]
impl VehicleRepository for SeaOrmRepository {
    async fn has_vehicle(&self, driver_id: Uuid) -> Result<bool, DbErr> {
        let count = vehicle::Entity::find()
            .filter(vehicle::Column::DriverId.eq(driver_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn vehicles_for_driver(&self, driver_id: Uuid) -> Result<Vec<vehicle::Model>, DbErr> {
        vehicle::Entity::find()
            .filter(vehicle::Column::DriverId.eq(driver_id))
            .order_by_asc(vehicle::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<vehicle::Model>, DbErr> {
        vehicle::Entity::find()
            .filter(vehicle::Column::LicensePlate.eq(plate))
            .one(&self.db)
            .await
    }

    async fn create_vehicle(&self, new_vehicle: NewVehicle) -> Result<vehicle::Model, DbErr> {
        vehicle::ActiveModel {
            id: Set(Uuid::new_v4()),
            driver_id: Set(new_vehicle.driver_id),
            make: Set(new_vehicle.make),
            model: Set(new_vehicle.model),
            license_plate: Set(new_vehicle.license_plate),
            color: Set(new_vehicle.color),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }
}

#[async_trait]
impl LocationRepository for SeaOrmRepository {
    async fn find_by_coordinate(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<location::Model>, DbErr> {
        location::Entity::find()
            .filter(location::Column::Latitude.eq(latitude))
            .filter(location::Column::Longitude.eq(longitude))
            .one(&self.db)
            .await
    }

    async fn insert_if_absent(
        &self,
        latitude: f64,
        longitude: f64,
        city: &str,
    ) -> Result<(), DbErr> {
        let new_location = location::ActiveModel {
            latitude: Set(latitude),
            longitude: Set(longitude),
            city: Set(city.to_string()),
            ..Default::default()
        };

        // INSERT ... ON CONFLICT (latitude, longitude) DO NOTHING
        location::Entity::insert(new_location)
            .on_conflict(
                OnConflict::columns([location::Column::Latitude, location::Column::Longitude])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TripRepository for SeaOrmRepository {
    async fn planned_trips_for_driver(
        &self,
        driver_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<TripDetails>, DbErr> {
        let trips = trip::Entity::find()
            .filter(trip::Column::DriverId.eq(driver_id))
            .filter(trip::Column::DepartureTime.gt(after))
            .order_by_asc(trip::Column::DepartureTime)
            .order_by_asc(trip::Column::Id)
            .all(&self.db)
            .await?;

        self.hydrate(trips, false).await
    }

    async fn trips_by_city_pair(
        &self,
        start_city: &str,
        end_city: &str,
    ) -> Result<Vec<TripDetails>, DbErr> {
        let locations_in = |city: &str| {
            location::Entity::find()
                .select_only()
                .column(location::Column::Id)
                .filter(location::Column::City.eq(city))
                .into_query()
        };

        let trips = trip::Entity::find()
            .filter(trip::Column::StartLocationId.in_subquery(locations_in(start_city)))
            .filter(trip::Column::EndLocationId.in_subquery(locations_in(end_city)))
            .order_by_asc(trip::Column::DepartureTime)
            .order_by_asc(trip::Column::Id)
            .all(&self.db)
            .await?;

        self.hydrate(trips, true).await
    }

    async fn insert_trip(&self, new_trip: NewTrip) -> Result<trip::Model, DbErr> {
        trip::ActiveModel {
            id: Set(Uuid::new_v4()),
            driver_id: Set(new_trip.driver_id),
            start_location_id: Set(new_trip.start_location_id),
            end_location_id: Set(new_trip.end_location_id),
            departure_time: Set(new_trip.departure_time.into()),
            total_seats: Set(new_trip.total_seats),
            available_seats: Set(new_trip.available_seats),
            price_per_seat: Set(new_trip.price_per_seat),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }
}
