use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::utils::jwt::verify_token;
use crate::AppState;

/// The authenticated user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("User ID not found in context".to_string()))
    }
}

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(auth) = auth
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(Principal {
        user_id: claims.sub,
        email: claims.email,
    });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::Request as HttpRequest;

    use super::*;

    #[tokio::test]
    async fn test_principal_from_extensions() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            email: "driver@example.com".to_string(),
        };
        let mut request = HttpRequest::builder().body(()).unwrap();
        request.extensions_mut().insert(principal.clone());
        let (mut parts, _) = request.into_parts();

        let extracted = Principal::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, principal);
    }

    #[tokio::test]
    async fn test_missing_principal_is_unauthorized() {
        let (mut parts, _) = HttpRequest::builder().body(()).unwrap().into_parts();

        let err = Principal::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
