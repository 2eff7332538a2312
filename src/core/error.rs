use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

/// PostgreSQL SQLSTATE codes the services react to
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Duplicate rating: {0}")]
    DuplicateRating(String),

    #[error("Rating not found: {0}")]
    RatingNotFound(String),

    #[error("Invalid report target: {0}")]
    InvalidTarget(String),

    #[error("Invalid admin action: {0}")]
    InvalidAction(String),

    #[error("Report already reviewed: {0}")]
    AlreadyReviewed(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),
}

impl AppError {
    /// Classify a sqlx error by SQLSTATE.
    ///
    /// `duplicate` builds the error returned for a unique-constraint hit, since
    /// only the caller knows which constraint it was protecting.
    pub fn from_db(e: sqlx::Error, duplicate: impl FnOnce() -> AppError) -> AppError {
        if let sqlx::Error::Database(db_err) = &e {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return duplicate(),
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::NotFound("Referenced record does not exist".to_string())
                }
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    return AppError::ConcurrencyConflict(
                        "Concurrent update detected, please retry".to_string(),
                    )
                }
                _ => {}
            }
        }

        tracing::error!("Database error: {:?}", e);
        AppError::Database(e)
    }
}

/// Default classification for statements that are not guarding a unique key
pub fn map_db_error(e: sqlx::Error) -> AppError {
    AppError::from_db(e, || {
        AppError::ConcurrencyConflict("Record was modified concurrently".to_string())
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
            AppError::DuplicateRating(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::RatingNotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::InvalidTarget(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::InvalidAction(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::AlreadyReviewed(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::ConcurrencyConflict(ref msg) => {
                tracing::warn!("Concurrency conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone(), None)
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (AppError::DuplicateRating("x".into()), StatusCode::CONFLICT),
            (AppError::RatingNotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidTarget("x".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidAction("x".into()), StatusCode::BAD_REQUEST),
            (AppError::AlreadyReviewed("x".into()), StatusCode::CONFLICT),
            (
                AppError::ConcurrencyConflict("x".into()),
                StatusCode::CONFLICT,
            ),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_non_database_error_is_kept_as_database() {
        let err = map_db_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
