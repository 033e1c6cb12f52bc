use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::AppResult;
use crate::handlers::bad_json;
use crate::services::account::{AuthResponse, LoginRequest, RegisterRequest};
use crate::AppState;

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload.map_err(bad_json)?;
    Ok(Json(state.accounts.register(payload).await?))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload.map_err(bad_json)?;
    Ok(Json(state.accounts.login(payload).await?))
}
