/// Error handling for the API server
///
/// Every handler returns `Result<T, ApiError>`; the single `IntoResponse`
/// implementation is the one place errors become HTTP. The response body is
/// always the same envelope:
///
/// ```json
/// { "status": "fail", "message": "..." }
/// ```
///
/// 4xx errors carry `"status": "fail"`, 5xx carry `"status": "error"`. In
/// production, 500 bodies are the generic message and the detail only goes
/// to the logs; in development the detail is included.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use trailbook_shared::auth::{jwt::JwtError, password::PasswordError};
use trailbook_shared::store::StoreError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Set once at startup; controls whether 500 bodies carry detail
static PRODUCTION: OnceLock<bool> = OnceLock::new();

/// Records whether the server runs in production mode
pub fn set_production(production: bool) {
    let _ = PRODUCTION.set(production);
}

fn is_production() -> bool {
    *PRODUCTION.get().unwrap_or(&false)
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - malformed input, failed validation, bad reset token
    BadRequest(String),

    /// Unauthorized (401) - missing/invalid/stale credentials
    Unauthorized(String),

    /// Forbidden (403) - authenticated but not allowed
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - unique-constraint violation
    Conflict(String),

    /// Internal server error (500)
    Internal(String),

    /// Upstream provider failure (500) - mail or payment transport
    ExternalService(String),
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// "fail" for 4xx, "error" for 5xx
    pub status: String,

    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ExternalService(msg) => write!(f, "External service error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::ExternalService(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Envelope status word: "fail" for client errors, "error" for server errors
    pub fn status_word(&self) -> &'static str {
        if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }

    /// Message exposed to the client
    fn client_message(self) -> String {
        match self {
            ApiError::Internal(msg) | ApiError::ExternalService(msg) => {
                tracing::error!("internal error: {}", msg);
                if is_production() {
                    "Something went very wrong!".to_string()
                } else {
                    msg
                }
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            status: self.status_word().to_string(),
            message: self.client_message(),
        });

        (status, body).into_response()
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_unique_violation() {
            return ApiError::Conflict("Duplicate field value. Please use another value.".to_string());
        }
        match err {
            StoreError::NotFound => ApiError::NotFound("No document found with that ID".to_string()),
            StoreError::Validation(errors) => {
                ApiError::BadRequest(format!("Invalid input data. {}", flatten_validation(&errors)))
            }
            StoreError::Database(err) => ApiError::from(err),
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                ApiError::NotFound("No document found with that ID".to_string())
            }
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                ApiError::Conflict("Duplicate field value. Please use another value.".to_string())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert validation errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Invalid input data. {}", flatten_validation(&errors)))
    }
}

/// Convert password hashing errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert session token errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => {
                ApiError::Unauthorized("Your token has expired. Please log in again.".to_string())
            }
            JwtError::CreateError(msg) => ApiError::Internal(msg),
            _ => ApiError::Unauthorized("Invalid token. Please log in again.".to_string()),
        }
    }
}

/// Flattens field errors into a single readable sentence
fn flatten_validation(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: invalid value", field),
            })
        })
        .collect();
    parts.sort();
    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized(String::new()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden(String::new()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict(String::new()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_status_word() {
        assert_eq!(ApiError::NotFound(String::new()).status_word(), "fail");
        assert_eq!(ApiError::Conflict(String::new()).status_word(), "fail");
        assert_eq!(ApiError::Internal(String::new()).status_word(), "error");
        assert_eq!(
            ApiError::ExternalService(String::new()).status_word(),
            "error"
        );
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err = ApiError::from(StoreError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = ApiError::from(StoreError::Validation(validator::ValidationErrors::new()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_expired_token_maps_to_401() {
        let err = ApiError::from(JwtError::Expired);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");
    }
}
