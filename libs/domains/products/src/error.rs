use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_helpers::{AppError, ErrorCode};
use thiserror::Error;

use crate::patch::PatchError;
use crate::validation::ValidationFailure;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationFailure),

    #[error("Invalid patch: {0}")]
    InvalidPatch(#[from] PatchError),

    #[error("Product was modified by another request")]
    ConditionFailed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => AppError::NotFound(format!("Product {} not found", id)),
            ProductError::Validation(failure) => AppError::BadRequest(failure.to_string()),
            ProductError::InvalidPatch(e) if e.is_conflict() => AppError::Conflict(e.to_string()),
            ProductError::InvalidPatch(e) => AppError::InvalidPatch(e.to_string()),
            ProductError::ConditionFailed => AppError::Conflict(
                "Product was modified by another request; fetch it again and retry".to_string(),
            ),
            ProductError::Database(msg) => AppError::Database(msg),
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        match self {
            // The validator's payload is the response body
            ProductError::Validation(failure) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Product validation failed: {}",
                    failure
                );
                (StatusCode::BAD_REQUEST, Json(failure)).into_response()
            }
            other => AppError::from(other).into_response(),
        }
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ProductError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ProductError::Internal(format!("Failed to encode product: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for ProductError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        ProductError::Internal(format!("Failed to decode product: {}", err))
    }
}
