//! Client-facing error type for request handlers serving compiled widgets.

use crate::core::WidgetError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl From<WidgetError> for ApiError {
    fn from(err: WidgetError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            code: self.code,
        });

        (self.status, body).into_response()
    }
}

/// Result of a lookup served to a client.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::ApiError;
    use crate::core::WidgetError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_missing_widget_is_bad_request() {
        let err = ApiError::from(WidgetError::NotFound("ghost".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "not_found");
        assert_eq!(err.message, "Widget 'ghost' not found");
    }

    #[test]
    fn test_internal_failures_are_server_errors() {
        let err = ApiError::from(WidgetError::Lock("poisoned".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
