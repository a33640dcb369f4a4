use crate::error::ApiError;
use crate::AppState;
use api_shared::auth::bearer_token;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Identity of the caller, resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?;

        state.identity.identify(token).map(Owner).map_err(|e| {
            tracing::warn!("rejected request: {}", e);
            ApiError::Unauthorized
        })
    }
}
