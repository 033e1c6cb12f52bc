pub mod auth;
pub mod trips;
pub mod vehicles;

use axum::extract::rejection::{JsonRejection, QueryRejection};

use crate::error::AppError;

/// Malformed JSON bodies are reported with the same `{"error": ..}` shape.
pub(crate) fn bad_json(rejection: JsonRejection) -> AppError {
    tracing::warn!(error = %rejection.body_text(), "Rejected request body");
    AppError::BadRequest(rejection.body_text())
}

/// Same for query strings that fail to deserialize.
pub(crate) fn bad_query(rejection: QueryRejection) -> AppError {
    tracing::warn!(error = %rejection.body_text(), "Rejected query string");
    AppError::BadRequest(rejection.body_text())
}
