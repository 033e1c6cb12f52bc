use sea_orm::DbErr;
use thiserror::Error;

use crate::entities::location;
use crate::repository::DynLocationRepository;
use crate::services::geocoder::{DynGeocoder, GeocodeError};

#[derive(Debug, Error)]
pub enum LocationError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("location at {latitude}, {longitude} missing after insert")]
    Missing { latitude: f64, longitude: f64 },
}

/// Maps coordinates to one canonical location row each.
pub struct LocationService {
    locations: DynLocationRepository,
    geocoder: DynGeocoder,
}

impl LocationService {
    pub fn new(locations: DynLocationRepository, geocoder: DynGeocoder) -> Self {
        Self {
            locations,
            geocoder,
        }
    }

    /// Return the location at exactly `(latitude, longitude)`, creating it if needed.
    ///
    /// Concurrent callers may both miss the first lookup and both insert; the
    /// unique coordinate constraint keeps one row and both re-read it.
    pub async fn find_or_create(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<location::Model, LocationError> {
        if let Some(existing) = self.locations.find_by_coordinate(latitude, longitude).await? {
            return Ok(existing);
        }

        let city = self.geocoder.city_for(latitude, longitude).await?;
        tracing::debug!(latitude, longitude, %city, "Creating location");

        self.locations
            .insert_if_absent(latitude, longitude, &city)
            .await?;

        self.locations
            .find_by_coordinate(latitude, longitude)
            .await?
            .ok_or(LocationError::Missing {
                latitude,
                longitude,
            })
    }
}
