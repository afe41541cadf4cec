//! API error types and handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dataeater::{DataEaterError, ErrorCode};
use serde::Serialize;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from client.
    BadRequest(String),
    /// Conflict (e.g., engine busy).
    Conflict(String),
    /// Internal server error.
    Internal(String),
    /// Error from the dataeater library.
    Store(DataEaterError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ErrorResponse {
    fn plain(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
            suggestion: None,
            detail: None,
        }
    }
}

fn store_error(err: DataEaterError) -> (StatusCode, ErrorResponse) {
    let status = match &err {
        DataEaterError::ColumnNotFound(_) => StatusCode::NOT_FOUND,
        DataEaterError::NoDataset => StatusCode::CONFLICT,
        DataEaterError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DataEaterError::Mutation(report) if report.code == ErrorCode::Interrupted => {
            StatusCode::CONFLICT
        }
        DataEaterError::Mutation(_) | DataEaterError::Sql(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let report = err.report();
    (
        status,
        ErrorResponse {
            error: report.code.as_str().to_string(),
            message: report.message,
            suggestion: Some(report.suggestion),
            detail: Some(report.raw_message),
        },
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::plain("not_found", msg)),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::plain("bad_request", msg))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::plain("conflict", msg)),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::plain("internal", msg),
            ),
            ApiError::Store(e) => store_error(e),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DataEaterError> for ApiError {
    fn from(err: DataEaterError) -> Self {
        ApiError::Store(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Store(e) => write!(f, "DataEater error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}
