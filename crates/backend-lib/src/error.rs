// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::credential::policy::RuleViolation;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Password rejected by policy: {0:?}")]
    PolicyRejected(Vec<RuleViolation>),

    #[error("Password matches a recently used credential")]
    PasswordReused,

    #[error("Principal not found")]
    PrincipalNotFound,

    #[error("Principal already exists")]
    PrincipalExists,

    #[error("Credential was changed by a concurrent request")]
    RotationConflict,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Credential hashing failed: {0}")]
    Hash(String),

    #[error("Audit record could not be written: {0}")]
    AuditWrite(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::PolicyRejected(_) | AppError::PasswordReused => {
                StatusCode::UNPROCESSABLE_ENTITY
            },
            AppError::PrincipalNotFound => StatusCode::NOT_FOUND,
            AppError::PrincipalExists | AppError::RotationConflict => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::PolicyRejected(_) => "POLICY_001",
            AppError::PasswordReused => "POLICY_002",
            AppError::PrincipalNotFound => "PRINCIPAL_001",
            AppError::PrincipalExists => "PRINCIPAL_002",
            AppError::RotationConflict => "PRINCIPAL_003",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Hash(_) => "HASH_001",
            AppError::AuditWrite(_) => "AUDIT_001",
            AppError::Database(_) => "DB_001",
            AppError::Json(_) => "JSON_001",
            AppError::Io(_) => "IO_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Validation outcomes are reported to the caller, never logged as errors.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::PolicyRejected(_)
                | AppError::PasswordReused
                | AppError::InvalidInput(_)
        )
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::PolicyRejected(_) => {
                "Password does not meet the strength requirements".to_string()
            },
            AppError::PasswordReused => {
                "Password was used recently and cannot be reused".to_string()
            },
            AppError::PrincipalNotFound => "Resource not found".to_string(),
            AppError::PrincipalExists => "Resource already exists".to_string(),
            AppError::RotationConflict => {
                "Resource was modified concurrently, retry the request".to_string()
            },
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::Hash(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
            AppError::AuditWrite(_) | AppError::Database(_) => {
                "A storage error occurred".to_string()
            },
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::Io(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let mut body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        // Policy rejections carry the specific unmet rules for the client
        if let AppError::PolicyRejected(violations) = &self {
            body["error"]["violations"] = serde_json::json!(violations);
        }

        (status, axum::Json(body)).into_response()
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::PolicyRejected(vec![RuleViolation::TooShort]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::PasswordReused.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::PrincipalNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::PrincipalExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::RotationConflict.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidInput("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_error_codes() {
        assert_eq!(
            AppError::PolicyRejected(vec![]).error_code(),
            "POLICY_001"
        );
        assert_eq!(AppError::PasswordReused.error_code(), "POLICY_002");
        assert_eq!(AppError::PrincipalNotFound.error_code(), "PRINCIPAL_001");
        assert_eq!(AppError::RotationConflict.error_code(), "PRINCIPAL_003");
        assert_eq!(
            AppError::Internal("test".to_string()).error_code(),
            "INT_001"
        );
    }

    #[test]
    fn test_validation_errors_are_not_faults() {
        assert!(AppError::PolicyRejected(vec![RuleViolation::MissingDigit]).is_validation());
        assert!(AppError::PasswordReused.is_validation());
        assert!(!AppError::Internal("boom".to_string()).is_validation());
        assert!(!AppError::AuditWrite(sqlx::Error::RowNotFound).is_validation());
    }

    #[test]
    fn test_app_error_into_response() {
        let error = AppError::PolicyRejected(vec![RuleViolation::TooShort]);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response_headers = response.headers();
        assert!(response_headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }

    #[test]
    fn test_error_from_impls() {
        let string_err = "String error".to_string();
        let app_err: AppError = string_err.into();
        assert!(matches!(app_err, AppError::Internal(_)));

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));
    }
}
