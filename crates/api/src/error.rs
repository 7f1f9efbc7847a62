//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, TeamError};
use persistence::PersistenceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain or persistence error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string()).increment(1);

        if status.is_server_error() {
            tracing::error!(error = %message, status = status.as_u16(), "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Persistence(e) => persistence_status(e),
        DomainError::Team(TeamError::HeroAlreadyMember(_) | TeamError::MissionInProgress(_)) => {
            StatusCode::CONFLICT
        }
        DomainError::Exercise(_)
        | DomainError::Hero(_)
        | DomainError::Team(_)
        | DomainError::Trainer(_)
        | DomainError::Client(_)
        | DomainError::WorkoutPlan(_) => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

fn persistence_status(err: &PersistenceError) -> StatusCode {
    match err {
        PersistenceError::Validation { .. } => StatusCode::BAD_REQUEST,
        PersistenceError::ConcurrencyConflict { .. } | PersistenceError::DuplicateKey { .. } => {
            StatusCode::CONFLICT
        }
        PersistenceError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError::Domain(err.into())
    }
}
