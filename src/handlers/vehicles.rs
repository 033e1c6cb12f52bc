use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::entities::vehicle;
use crate::error::AppResult;
use crate::handlers::bad_json;
use crate::middleware::auth::Principal;
use crate::services::account::AddVehicleRequest;
use crate::AppState;

/// Register a vehicle for the logged-in driver
pub async fn add_vehicle(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<AddVehicleRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<vehicle::Model>)> {
    let Json(payload) = payload.map_err(bad_json)?;
    let vehicle = state.accounts.add_vehicle(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// List the logged-in driver's vehicles
pub async fn my_vehicles(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    Ok(Json(state.accounts.vehicles(&principal).await?))
}
