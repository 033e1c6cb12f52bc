use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{location, trip, user};
use crate::error::{AppError, AppResult, FieldError};
use crate::middleware::auth::Principal;
use crate::repository::{
    DynTripRepository, DynUserRepository, DynVehicleRepository, NewTrip, TripDetails,
};
use crate::services::location::LocationService;

/// Departure times are given as `DD.MM.YYYY HH:MM`, in UTC.
pub const DEPARTURE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Debug, Default, Deserialize)]
pub struct CreateTripRequest {
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub end_latitude: Option<f64>,
    pub end_longitude: Option<f64>,
    pub departure_time: Option<String>,
    pub total_seats: Option<i32>,
    pub price_per_seat: Option<f64>,
}

/// A [`CreateTripRequest`] with every field present and in range.
#[derive(Debug, Clone, PartialEq)]
pub struct TripInput {
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub departure_time: String,
    pub total_seats: i32,
    pub price_per_seat: f64,
}

fn required<T>(
    value: Option<T>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    if value.is_none() {
        errors.push(FieldError {
            field,
            message: "is required".to_string(),
        });
    }
    value
}

fn check_range(value: Option<f64>, field: &'static str, limit: f64, errors: &mut Vec<FieldError>) {
    if let Some(v) = value {
        if !(-limit..=limit).contains(&v) {
            errors.push(FieldError {
                field,
                message: format!("must be between -{limit} and {limit}"),
            });
        }
    }
}

impl CreateTripRequest {
    /// Check presence and ranges, reporting every offending field at once.
    pub fn validate(self) -> Result<TripInput, Vec<FieldError>> {
        let mut errors = Vec::new();

        let start_latitude = required(self.start_latitude, "start_latitude", &mut errors);
        let start_longitude = required(self.start_longitude, "start_longitude", &mut errors);
        let end_latitude = required(self.end_latitude, "end_latitude", &mut errors);
        let end_longitude = required(self.end_longitude, "end_longitude", &mut errors);
        let departure_time = required(
            self.departure_time.filter(|t| !t.trim().is_empty()),
            "departure_time",
            &mut errors,
        );
        let total_seats = required(self.total_seats, "total_seats", &mut errors);
        let price_per_seat = required(self.price_per_seat, "price_per_seat", &mut errors);

        check_range(start_latitude, "start_latitude", 90.0, &mut errors);
        check_range(end_latitude, "end_latitude", 90.0, &mut errors);
        check_range(start_longitude, "start_longitude", 180.0, &mut errors);
        check_range(end_longitude, "end_longitude", 180.0, &mut errors);

        if let Some(seats) = total_seats {
            if seats < 1 {
                errors.push(FieldError {
                    field: "total_seats",
                    message: "must be at least 1".to_string(),
                });
            }
        }

        if let Some(price) = price_per_seat {
            if !price.is_finite() || price < 0.0 {
                errors.push(FieldError {
                    field: "price_per_seat",
                    message: "must be a non-negative amount".to_string(),
                });
            }
        }

        match (
            start_latitude,
            start_longitude,
            end_latitude,
            end_longitude,
            departure_time,
            total_seats,
            price_per_seat,
        ) {
            (Some(sla), Some(slo), Some(ela), Some(elo), Some(dt), Some(ts), Some(pps))
                if errors.is_empty() =>
            {
                Ok(TripInput {
                    start_latitude: sla,
                    start_longitude: slo,
                    end_latitude: ela,
                    end_longitude: elo,
                    departure_time: dt,
                    total_seats: ts,
                    price_per_seat: pps,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Exactly `DD.MM.YYYY HH:MM`: zero-padded fields, unsigned four-digit year.
fn has_departure_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 16
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'.',
            10 => *b == b' ',
            13 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

pub fn parse_departure_time(value: &str) -> AppResult<DateTime<Utc>> {
    let invalid = || {
        AppError::BadRequest("Invalid departure time format. Use 'DD.MM.YYYY HH:MM'".to_string())
    };

    // chrono alone accepts unpadded fields and signed years
    if !has_departure_shape(value) {
        return Err(invalid());
    }

    NaiveDateTime::parse_from_str(value, DEPARTURE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

#[derive(Debug, Serialize)]
pub struct DriverInfo {
    pub id: Uuid,
    pub name: String,
}

impl From<user::Model> for DriverInfo {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub driver_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverInfo>,
    pub start_location_id: i32,
    pub start_location: location::Model,
    pub end_location_id: i32,
    pub end_location: location::Model,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub price_per_seat: f64,
    pub created_at: DateTime<Utc>,
}

impl TripResponse {
    fn new(
        trip: trip::Model,
        driver: Option<user::Model>,
        start_location: location::Model,
        end_location: location::Model,
    ) -> Self {
        Self {
            id: trip.id,
            driver_id: trip.driver_id,
            driver: driver.map(DriverInfo::from),
            start_location_id: trip.start_location_id,
            start_location,
            end_location_id: trip.end_location_id,
            end_location,
            departure_time: trip.departure_time.with_timezone(&Utc),
            total_seats: trip.total_seats,
            available_seats: trip.available_seats,
            price_per_seat: trip.price_per_seat,
            created_at: trip.created_at.with_timezone(&Utc),
        }
    }
}

impl From<TripDetails> for TripResponse {
    fn from(details: TripDetails) -> Self {
        Self::new(
            details.trip,
            details.driver,
            details.start_location,
            details.end_location,
        )
    }
}

fn store_failure(message: &'static str) -> impl FnOnce(DbErr) -> AppError {
    move |e| {
        tracing::error!(error = %e, "{}", message);
        AppError::Internal(message.to_string())
    }
}

pub struct TripService {
    users: DynUserRepository,
    vehicles: DynVehicleRepository,
    trips: DynTripRepository,
    locations: LocationService,
}

impl TripService {
    pub fn new(
        users: DynUserRepository,
        vehicles: DynVehicleRepository,
        trips: DynTripRepository,
        locations: LocationService,
    ) -> Self {
        Self {
            users,
            vehicles,
            trips,
            locations,
        }
    }

    /// Upcoming trips of the principal, earliest departure first.
    pub async fn planned_trips_for_driver(
        &self,
        principal: &Principal,
    ) -> AppResult<Vec<TripResponse>> {
        let trips = self
            .trips
            .planned_trips_for_driver(principal.user_id, Utc::now())
            .await
            .map_err(store_failure("Failed to fetch planned trips"))?;

        Ok(trips.into_iter().map(TripResponse::from).collect())
    }

    /// `request` is the already-extracted body; an unreadable body is only
    /// reported once the driver and their vehicle have been confirmed.
    pub async fn create_trip(
        &self,
        principal: &Principal,
        request: AppResult<CreateTripRequest>,
    ) -> AppResult<TripResponse> {
        let driver = self
            .users
            .find_user(principal.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unauthorized: Invalid driver ID".to_string()))?;

        if !self.vehicles.has_vehicle(driver.id).await? {
            return Err(AppError::BadRequest(
                "Driver must add a vehicle before planning a trip".to_string(),
            ));
        }

        let input = request?.validate().map_err(|errors| {
            tracing::warn!(driver_id = %driver.id, ?errors, "Rejected trip input");
            AppError::Validation(errors)
        })?;

        let departure_time = parse_departure_time(&input.departure_time)?;

        let start_location = self
            .locations
            .find_or_create(input.start_latitude, input.start_longitude)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to find or create start location");
                AppError::Internal("Failed to find or create start location".to_string())
            })?;

        let end_location = self
            .locations
            .find_or_create(input.end_latitude, input.end_longitude)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to find or create end location");
                AppError::Internal("Failed to find or create end location".to_string())
            })?;

        let trip = self
            .trips
            .insert_trip(NewTrip {
                driver_id: driver.id,
                start_location_id: start_location.id,
                end_location_id: end_location.id,
                departure_time,
                total_seats: input.total_seats,
                available_seats: input.total_seats,
                price_per_seat: input.price_per_seat,
            })
            .await
            .map_err(store_failure("Failed to create trip"))?;

        tracing::info!(
            trip_id = %trip.id,
            driver_id = %driver.id,
            from = %start_location.city,
            to = %end_location.city,
            "Trip created"
        );

        Ok(TripResponse::new(trip, None, start_location, end_location))
    }

    /// Trips between two cities, matched exactly and case-sensitively.
    pub async fn search_trips(
        &self,
        start_city: &str,
        end_city: &str,
    ) -> AppResult<Vec<TripResponse>> {
        if start_city.is_empty() || end_city.is_empty() {
            return Err(AppError::BadRequest(
                "Start city and end city are required".to_string(),
            ));
        }

        let trips = self
            .trips
            .trips_by_city_pair(start_city, end_city)
            .await
            .map_err(store_failure("Failed to search trips"))?;

        Ok(trips.into_iter().map(TripResponse::from).collect())
    }
}
