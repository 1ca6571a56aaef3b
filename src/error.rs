use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Ratio error: {0}")]
    Ratio(#[from] RatioError),

    #[error("Charge error: {0}")]
    Charge(#[from] ChargeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Ratio configuration errors
#[derive(Error, Debug)]
pub enum RatioError {
    #[error("Only the group admin can set payment ratios")]
    NotAdmin,

    #[error("User {0} is not a member of this group")]
    NotAMember(Uuid),

    #[error("Ratio percentages must sum to 100, got {0}")]
    InvalidTotal(String),

    #[error("Ratio percentage out of range for user {user_id}: {percentage}")]
    OutOfRange { user_id: Uuid, percentage: String },

    #[error("Group has no members to split across")]
    EmptyGroup,
}

/// Per-member charge errors, isolated to one member within a run and
/// never fatal to the run itself
#[derive(Error, Debug)]
pub enum ChargeError {
    #[error("Payment processor call failed: {0}")]
    ProcessorCall(String),

    #[error("Charge timed out after {0}s")]
    Timeout(u64),

    #[error("No payment instrument on file")]
    NoInstrument,
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Authentication(msg) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                msg,
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg,
                None,
            ),
            AppError::Ratio(RatioError::NotAdmin) => (
                StatusCode::FORBIDDEN,
                "NOT_GROUP_ADMIN",
                "Only the group admin can set payment ratios".to_string(),
                None,
            ),
            AppError::Ratio(RatioError::NotAMember(user_id)) => (
                StatusCode::BAD_REQUEST,
                "NOT_A_MEMBER",
                format!("User {} is not a member of this group", user_id),
                Some(serde_json::json!({ "user_id": user_id })),
            ),
            AppError::Ratio(RatioError::InvalidTotal(total)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_RATIO_TOTAL",
                format!("Ratio percentages must sum to 100, got {}", total),
                Some(serde_json::json!({ "total": total })),
            ),
            AppError::Ratio(err) => (
                StatusCode::BAD_REQUEST,
                "INVALID_RATIOS",
                err.to_string(),
                None,
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                msg,
                None,
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                msg,
                None,
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg,
                None,
            ),
            AppError::Persistence(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_FAILURE",
                msg,
                None,
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::Validation(format!("Decimal conversion error: {:?}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Charge(ChargeError::ProcessorCall(format!(
            "HTTP request error: {:?}",
            error
        )))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
