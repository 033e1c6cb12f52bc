use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::{bad_json, bad_query};
use crate::middleware::auth::Principal;
use crate::services::trip::{CreateTripRequest, TripResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TripListResponse {
    pub trips: Vec<TripResponse>,
}

#[derive(Debug, Serialize)]
pub struct CreateTripResponse {
    pub message: &'static str,
    pub trip: TripResponse,
}

/// Query parameters arrive percent-decoded.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub start_city: String,
    #[serde(default)]
    pub end_city: String,
}

/// Upcoming trips of the logged-in driver
pub async fn planned_trips(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<TripListResponse>> {
    let trips = state.trips.planned_trips_for_driver(&principal).await?;
    Ok(Json(TripListResponse { trips }))
}

/// Offer a new trip as the logged-in driver
pub async fn create_trip(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<CreateTripRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreateTripResponse>)> {
    // Body errors surface after the driver checks inside the service
    let payload = payload.map(|Json(payload)| payload).map_err(bad_json);
    let trip = state.trips.create_trip(&principal, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTripResponse {
            message: "Trip created successfully",
            trip,
        }),
    ))
}

/// Search trips by start and end city
pub async fn search_trips(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> AppResult<Json<TripListResponse>> {
    let Query(params) = params.map_err(bad_query)?;
    let trips = state
        .trips
        .search_trips(&params.start_city, &params.end_city)
        .await?;
    Ok(Json(TripListResponse { trips }))
}
