use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// JSON error body: `{"error": <title>, "detail": <optional text>}`.
#[derive(Debug, Clone)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: String,
    pub detail: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &str, detail: Option<String>) -> Self {
        Self { status, error: error.to_string(), detail }
    }

    pub fn unauthorized() -> Self { Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None) }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.error, detail = ?self.detail, "request failed");
        } else {
            warn!(status = %self.status, error = %self.error, detail = ?self.detail, "request rejected");
        }
        (self.status, Json(ErrorBody { error: self.error, detail: self.detail })).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let detail = Some(e.to_string());
        if e.is_validation() {
            return Self::new(StatusCode::BAD_REQUEST, "Validation Error", detail);
        }
        match e {
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            ServiceError::ImageStore(_) => Self::new(StatusCode::BAD_GATEWAY, "Image Store Error", detail),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", detail),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let detail = Some(format!("{} (code {})", e, e.code()));
        match e {
            AuthError::Validation(_) | AuthError::InvalidState => Self::new(StatusCode::BAD_REQUEST, "Bad Request", detail),
            AuthError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail),
            AuthError::Disabled => Self::new(StatusCode::NOT_FOUND, "Not Found", detail),
            AuthError::OAuth(_) => Self::new(StatusCode::BAD_GATEWAY, "OAuth Provider Error", detail),
            AuthError::TokenError(_) | AuthError::Repository(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", detail)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
