/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`; every domain error of the
/// shared crate converts into an `ApiError`, which renders as
///
/// ```json
/// { "error": "forbidden", "message": "...", "details": [{ "field": "...", "message": "..." }] }
/// ```
///
/// with `details` present only for validation failures.
///
/// # Example
///
/// ```
/// use softdesk_api::error::{ApiError, ApiResult};
///
/// fn require_title(title: &str) -> ApiResult<()> {
///     if title.is_empty() {
///         return Err(ApiError::validation("title", "This field may not be blank"));
///     }
///     Ok(())
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use softdesk_shared::auth::authorization::AuthzError;
use softdesk_shared::auth::jwt::JwtError;
use softdesk_shared::auth::middleware::AuthError;
use softdesk_shared::auth::password::PasswordError;
use softdesk_shared::scope::ScopeError;
use softdesk_shared::store::StoreError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate identity or membership
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        }])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Logged, never exposed
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::UniqueViolation { .. } => match err.conflicting_field() {
                Some(field) => ApiError::Conflict(format!("A user with that {} already exists", field)),
                None => ApiError::Conflict("Resource already exists".to_string()),
            },
            StoreError::ForeignKeyViolation { constraint } => {
                ApiError::NotFound(format!("Referenced resource not found ({})", constraint))
            }
            StoreError::Database(e) => ApiError::InternalError(format!("Database error: {}", e)),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember { .. } => {
                ApiError::Forbidden("You are not a contributor of this project".to_string())
            }
            AuthzError::NotAuthor => {
                ApiError::Forbidden("Only the author can modify this resource".to_string())
            }
        }
    }
}

impl From<ScopeError> for ApiError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            ScopeError::Forbidden(e) => e.into(),
            ScopeError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Authentication credentials were not provided".to_string())
            }
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => {
                ApiError::Unauthorized(msg)
            }
            AuthError::Revoked => ApiError::Unauthorized("Token has been revoked".to_string()),
            AuthError::Store(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            JwtError::WrongTokenType { expected, .. } => {
                ApiError::Unauthorized(format!("A {} token is required", expected))
            }
            JwtError::ValidationError(_) => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct TitleForm {
        #[validate(length(min = 1, max = 5, message = "Too long"))]
        title: String,
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Conflict("Username taken".to_string());
        assert_eq!(err.to_string(), "Conflict: Username taken");

        let err = ApiError::NotFound("Issue not found".to_string());
        assert_eq!(err.to_string(), "Not found: Issue not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::validation("f", "m"), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_scope_errors_map_to_404_and_403() {
        let not_found: ApiError = ScopeError::NotFound("Issue").into();
        assert!(matches!(not_found, ApiError::NotFound(ref m) if m == "Issue not found"));

        let forbidden: ApiError = ScopeError::Forbidden(AuthzError::NotAuthor).into();
        assert!(matches!(forbidden, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_unique_violation_names_the_field() {
        let err: ApiError = StoreError::UniqueViolation {
            constraint: softdesk_shared::store::USERS_USERNAME_KEY.to_string(),
        }
        .into();

        assert!(matches!(err, ApiError::Conflict(ref m) if m.contains("username")));
    }

    #[test]
    fn test_validator_errors_become_details() {
        let form = TitleForm {
            title: "far too long".to_string(),
        };

        let err: ApiError = form.validate().unwrap_err().into();
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(
                    details,
                    vec![ValidationErrorDetail {
                        field: "title".to_string(),
                        message: "Too long".to_string(),
                    }]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
