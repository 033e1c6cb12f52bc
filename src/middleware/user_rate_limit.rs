use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
    GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::middleware::auth::Principal;
use crate::middleware::rate_limit::rate_limit_error_handler;

/// Keys rate limits on the authenticated user (set by auth_middleware)
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        req.extensions()
            .get::<Principal>()
            .map(|principal| principal.user_id)
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

pub type UserGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Per-user limit for authenticated routes: 250 requests per minute
pub fn create_user_governor() -> UserGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(240)
            .burst_size(250)
            .key_extractor(UserIdExtractor)
            .finish()
            .expect("user rate limit config"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}
