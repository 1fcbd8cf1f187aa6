use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Failure kinds for one-time code verification. Kept separate from
/// `AppError` so the consume path can be tested as plain data.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpFailure {
    #[error("No verification code was requested for this phone")]
    NotRequested,

    #[error("Verification code has already been used")]
    AlreadyUsed,

    #[error("Verification code has expired")]
    Expired,

    #[error("Verification code is incorrect")]
    Mismatch,
}

impl OtpFailure {
    pub fn code(&self) -> &'static str {
        match self {
            OtpFailure::NotRequested => "OTP_NOT_REQUESTED",
            OtpFailure::AlreadyUsed => "OTP_ALREADY_USED",
            OtpFailure::Expired => "OTP_EXPIRED",
            OtpFailure::Mismatch => "OTP_MISMATCH",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Phone number is already registered")]
    DuplicatePhone,

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("Unknown subscription plan: {0}")]
    InvalidPlan(String),

    #[error("No active subscription")]
    NoActiveSubscription,

    #[error("{0}")]
    OtpError(#[from] OtpFailure),

    #[error("Could not allocate a unique public id")]
    IdSpaceExhausted,

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::DuplicatePhone => {
                (StatusCode::CONFLICT, "DUPLICATE_PHONE", self.to_string())
            }
            AppError::DuplicateEmail => {
                (StatusCode::CONFLICT, "DUPLICATE_EMAIL", self.to_string())
            }
            AppError::InvalidPlan(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_PLAN", self.to_string())
            }
            AppError::NoActiveSubscription => (
                StatusCode::BAD_REQUEST,
                "NO_ACTIVE_SUBSCRIPTION",
                self.to_string(),
            ),
            AppError::OtpError(failure) => {
                log::warn!("OTP verification failed: {failure}");
                (StatusCode::UNAUTHORIZED, failure.code(), failure.to_string())
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                if matches!(err.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature) {
                    (
                        StatusCode::UNAUTHORIZED,
                        "TOKEN_EXPIRED",
                        "Token has expired".to_string(),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        "TOKEN_INVALID",
                        "Invalid token".to_string(),
                    )
                }
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR", msg.clone())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
