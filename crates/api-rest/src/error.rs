use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use research_core::ResearchError;

/// Failure of a REST request, rendered as a JSON `{"detail": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Research(ResearchError),
    Internal(String),
}

impl From<ResearchError> for ApiError {
    fn from(e: ResearchError) -> Self {
        ApiError::Research(e)
    }
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Could not validate credentials".into(),
            ),
            ApiError::Research(e) => match e {
                ResearchError::RecordNotFound => {
                    (StatusCode::NOT_FOUND, "Research not found".into())
                }
                ResearchError::AccessDenied => (StatusCode::FORBIDDEN, "Access denied".into()),
                ResearchError::StillInProgress => (
                    StatusCode::BAD_REQUEST,
                    "Research is still in progress".into(),
                ),
                ResearchError::InvalidInput(message) => {
                    (StatusCode::BAD_REQUEST, message.clone())
                }
                ResearchError::RenderFailure(cause) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error generating document: {}", cause),
                ),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }
        (status, Json(ErrorRes { detail })).into_response()
    }
}
