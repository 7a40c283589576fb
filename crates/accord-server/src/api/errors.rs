//! Error handling for the Accord Server API
//!
//! This module contains standardized error handling for the API.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::error::ServerError;

/// API Error type for returning standard error responses
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),
    /// Not found (404)
    NotFound(String),
    /// Internal server error (500)
    InternalServerError(String),
    /// Wrapped server error
    ServerError(ServerError),
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        ApiError::ServerError(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ServerError(err) => write!(f, "Server Error: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND", msg),
            ApiError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ERR_INTERNAL_SERVER_ERROR",
                msg,
            ),
            ApiError::ServerError(err) => {
                // Use our existing error handler for ServerError
                return api_error_response(err);
            }
        };

        let body = Json(json!({
            "error": message,
            "errorDetails": {
                "errorCode": error_code,
                "errorMessage": message,
            }
        }));

        (status, body).into_response()
    }
}

/// General error response handler for API errors
/// This will convert a ServerError into a standardized API error response
pub fn api_error_response(err: &ServerError) -> axum::response::Response {
    let (status_code, error_code, error_message) = match err {
        ServerError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "ERR_NOT_FOUND".to_string(),
            err.to_string(),
        ),
        ServerError::ValidationError(msg) => (
            StatusCode::BAD_REQUEST,
            "ERR_VALIDATION_ERROR".to_string(),
            msg.clone(),
        ),
        ServerError::EngineApiError(msg) => (
            StatusCode::BAD_GATEWAY,
            "ERR_ENGINE_API_ERROR".to_string(),
            msg.clone(),
        ),
        ServerError::ResolutionFailure(msg) => (
            StatusCode::BAD_GATEWAY,
            "ERR_RESOLUTION_FAILURE".to_string(),
            msg.clone(),
        ),
        ServerError::BuildFailure(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "ERR_BUILD_FAILURE".to_string(),
            msg.clone(),
        ),
        ServerError::DeliveryFailure { .. } => (
            StatusCode::BAD_GATEWAY,
            "ERR_DELIVERY_FAILURE".to_string(),
            err.to_string(),
        ),
        ServerError::StoreError(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "ERR_STORE_ERROR".to_string(),
            msg.clone(),
        ),
        ServerError::ConfigurationError(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "ERR_CONFIGURATION_ERROR".to_string(),
            msg.clone(),
        ),
        ServerError::InternalError(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "ERR_INTERNAL_ERROR".to_string(),
            msg.clone(),
        ),
    };

    let body = Json(json!({
        "error": error_message,
        "errorDetails": {
            "errorCode": error_code,
            "errorMessage": error_message,
        }
    }));

    (status_code, body).into_response()
}
