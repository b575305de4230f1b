//! Error taxonomy for the ingestion service.
//!
//! Four kinds, each carrying a stable machine code the client can switch on,
//! and each mapping to exactly one HTTP status.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Validation(ValidationError),
    RateLimit { retry_after_secs: u64, tier: &'static str },
    Internal(InternalError),
}

#[derive(Debug, Clone, Copy)]
pub enum AuthError {
    ProjectKeyMissing,
    SignatureMissing,
    AdminTokenMissing,
    ProjectNotFound,
    SignatureInvalid,
    AdminTokenInvalid,
    DatabaseError,
}

#[derive(Debug)]
pub enum ValidationError {
    ProjectRequired,
    TooManyEvents,
    InvalidEventData(String),
}

#[derive(Debug)]
pub enum InternalError {
    Internal,
    DbQueryFailed,
    DbInsertFailed,
    DbBulkInsertFailed,
    DbNotInitialized,
}

impl AuthError {
    fn code(self) -> &'static str {
        match self {
            AuthError::ProjectKeyMissing => "PROJECT_KEY_MISSING",
            AuthError::SignatureMissing => "SIGNATURE_MISSING",
            AuthError::AdminTokenMissing => "ADMIN_TOKEN_MISSING",
            AuthError::ProjectNotFound => "PROJECT_NOT_FOUND",
            AuthError::SignatureInvalid => "SIGNATURE_INVALID",
            AuthError::AdminTokenInvalid => "ADMIN_TOKEN_INVALID",
            AuthError::DatabaseError => "DATABASE_ERROR",
        }
    }
}

impl ValidationError {
    fn code(&self) -> &'static str {
        match self {
            ValidationError::ProjectRequired => "PROJECT_REQUIRED",
            ValidationError::TooManyEvents => "TOO_MANY_EVENTS",
            ValidationError::InvalidEventData(_) => "INVALID_EVENT_DATA",
        }
    }
}

impl InternalError {
    fn code(&self) -> &'static str {
        match self {
            InternalError::Internal => "INTERNAL_ERROR",
            InternalError::DbQueryFailed => "DB_QUERY_FAILED",
            InternalError::DbInsertFailed => "DB_INSERT_FAILED",
            InternalError::DbBulkInsertFailed => "DB_BULK_INSERT_FAILED",
            InternalError::DbNotInitialized => "DB_NOT_INITIALIZED",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "auth error: {}", e.code()),
            AppError::Validation(e) => write!(f, "validation error: {}", e.code()),
            AppError::RateLimit { tier, .. } => write!(f, "rate limit exceeded ({tier})"),
            AppError::Internal(e) => write!(f, "internal error: {}", e.code()),
        }
    }
}

impl std::error::Error for AppError {}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}

impl From<InternalError> for AppError {
    fn from(e: InternalError) -> Self {
        AppError::Internal(e)
    }
}

/// Any `sqlx` failure that reaches a handler is an infrastructure failure,
/// never a validation failure — callers that need "not found" must check
/// for it before propagating.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("store error: {e}");
        AppError::Internal(InternalError::DbQueryFailed)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, error_id) = match &self {
            AppError::Auth(e) => (
                StatusCode::UNAUTHORIZED,
                e.code(),
                "authentication failed".to_string(),
                None,
            ),
            AppError::Validation(e) => {
                let message = match e {
                    ValidationError::ProjectRequired => "project is required".to_string(),
                    ValidationError::TooManyEvents => "too many events in batch".to_string(),
                    ValidationError::InvalidEventData(detail) => detail.clone(),
                };
                (StatusCode::BAD_REQUEST, e.code(), message, None)
            }
            AppError::RateLimit { tier, .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                match *tier {
                    "address" => "IP_RATE_LIMIT_EXCEEDED",
                    "tenant" => "PROJECT_RATE_LIMIT_EXCEEDED",
                    _ => "RATE_LIMIT_EXCEEDED",
                },
                "rate limit exceeded".to_string(),
                None,
            ),
            AppError::Internal(e) => {
                let id = Uuid::new_v4().to_string();
                tracing::error!(error_id = %id, "internal error: {}", e.code());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.code(),
                    "internal error".to_string(),
                    Some(id),
                )
            }
        };

        let body = Json(ErrorBody {
            error: message,
            code,
            error_id,
        });

        let mut response = (status, body).into_response();
        if let AppError::RateLimit { retry_after_secs, .. } = &self {
            if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert("Retry-After", v);
            }
        }
        response
    }
}
