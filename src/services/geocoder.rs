use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoder returned an error: {0}")]
    Upstream(String),
    #[error("no city found at {latitude}, {longitude}")]
    NoCity { latitude: f64, longitude: f64 },
}

/// Resolves a coordinate to the name of the city it lies in.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn city_for(&self, latitude: f64, longitude: f64) -> Result<String, GeocodeError>;
}

pub type DynGeocoder = Arc<dyn Geocoder>;

/// Reverse geocoding against a Nominatim instance.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        // Nominatim's usage policy rejects requests without an identifying agent
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
}

impl Address {
    fn into_city(self) -> Option<String> {
        [self.city, self.town, self.village, self.municipality, self.county]
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
    }
}

fn city_from_response(
    response: ReverseResponse,
    latitude: f64,
    longitude: f64,
) -> Result<String, GeocodeError> {
    if let Some(error) = response.error {
        return Err(GeocodeError::Upstream(error));
    }

    response
        .address
        .and_then(Address::into_city)
        .ok_or(GeocodeError::NoCity { latitude, longitude })
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn city_for(&self, latitude: f64, longitude: f64) -> Result<String, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);

        tracing::debug!(latitude, longitude, "Reverse geocoding");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseResponse>()
            .await?;

        city_from_response(response, latitude, longitude)
    }
}
