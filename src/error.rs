//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used by the HTTP layer.
//! `AppError` implements `actix_web::error::ResponseError` to turn application
//! errors into HTTP responses with JSON bodies of the form `{"error": ...}`.
//!
//! Expired tokens get their own variant so the response can carry
//! `"code": "token_expired"`; the front-end uses it to refresh silently instead
//! of forcing a new login.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::AuthError;

/// Machine-readable code attached to 401 responses caused by an expired token.
pub const TOKEN_EXPIRED_CODE: &str = "token_expired";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is required but missing (HTTP 401).
    Unauthorized(String),
    /// A token was well-formed but past its expiry (HTTP 401, `code: token_expired`).
    TokenExpired(String),
    /// Represents a client-side error due to a malformed or invalid request (HTTP 400).
    BadRequest(String),
    /// Represents a situation where a requested resource was not found (HTTP 404).
    NotFound(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Represents an error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Represents an error due to failed input validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::TokenExpired(msg) => write!(f, "Token Expired: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::TokenExpired(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            AppError::TokenExpired(msg) => response.json(json!({
                "error": msg,
                "code": TOKEN_EXPIRED_CODE
            })),
            // Storage details stay in the logs.
            AppError::DatabaseError(msg) => {
                log::error!("database error: {}", msg);
                response.json(json!({ "error": "Database error" }))
            }
            AppError::InternalServerError(msg) => {
                log::error!("internal error: {}", msg);
                response.json(json!({ "error": "Internal server error" }))
            }
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => response.json(json!({ "error": msg })),
        }
    }
}

/// Maps session-layer failures onto HTTP semantics.
///
/// Invalid and revoked tokens share one message; the response never says which.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::InvalidToken => AppError::Unauthorized("Invalid token".into()),
            AuthError::ExpiredToken => AppError::TokenExpired("Token expired".into()),
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid username or password".into())
            }
            AuthError::IdentityNotFound => AppError::Unauthorized("User no longer exists".into()),
            AuthError::UsernameTaken => AppError::BadRequest("Username already exists".into()),
            AuthError::StoreFailure(msg) => AppError::DatabaseError(msg),
            AuthError::PasswordHash(msg) | AuthError::Signing(msg) => {
                AppError::InternalServerError(msg)
            }
            AuthError::MissingSecret => {
                AppError::InternalServerError("Signing secret is not configured".into())
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `sqlx::Error::RowNotFound` maps to `AppError::NotFound`, everything else to
/// `AppError::DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}
