/// Identity endpoints
///
/// - `POST /signup` - Register a new account
/// - `POST /api/token` - Exchange username + password for a token pair
/// - `POST /api/token/refresh` - Exchange a refresh token for an access token
/// - `POST /logout` - Revoke the caller's tokens

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiJson,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use softdesk_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::user::CreateUser,
};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Letters, digits and `@ . + - _`
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');

    if username.chars().all(allowed) {
        Ok(())
    } else {
        let mut error = ValidationError::new("username");
        error.message = Some(Cow::Borrowed(
            "Username may contain only letters, digits and @/./+/-/_",
        ));
        Err(error)
    }
}

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: String,

    pub password: String,

    /// Confirmation, must equal `password`
    pub password2: String,
}

/// Public view of the registered account
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user: SignupUser,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub username: String,

    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Optional logout body
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to revoke alongside the access token
    pub refresh: Option<String>,
}

/// Registers a new account and signs it in
///
/// # Endpoint
///
/// ```text
/// POST /signup
///
/// {
///   "email": "alice@example.com",
///   "username": "alice",
///   "first_name": "Alice",
///   "last_name": "Martin",
///   "password": "Correct-Horse-9",
///   "password2": "Correct-Horse-9"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "user": { "id": "uuid", "email": "...", "username": "alice", "first_name": "...", "last_name": "..." },
///   "access": "eyJ...",
///   "refresh": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `422`: Invalid fields, mismatched confirmation, weak password
/// - `409`: Email or username already taken
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    req.validate()?;

    if req.password != req.password2 {
        return Err(ApiError::validation("password", "Password fields didn't match"));
    }

    let violations = password::password_policy_violations(&req.password, &req.username);
    if !violations.is_empty() {
        return Err(ApiError::ValidationError(
            violations
                .into_iter()
                .map(|message| ValidationErrorDetail {
                    field: "password".to_string(),
                    message,
                })
                .collect(),
        ));
    }

    if state.store.find_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict(
            "A user with that email already exists".to_string(),
        ));
    }

    if state
        .store
        .find_user_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A user with that username already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A racing duplicate still fails here on the unique indexes (409)
    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            password_hash,
        })
        .await?;

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: SignupUser {
                id: user.id,
                email: user.email,
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
            },
            tokens,
        }),
    ))
}

/// Issues an access + refresh token pair
///
/// # Endpoint
///
/// ```text
/// POST /api/token
///
/// { "username": "alice", "password": "Correct-Horse-9" }
/// ```
///
/// # Errors
///
/// - `401`: Unknown username or wrong password (indistinguishable)
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> ApiResult<Json<TokenPair>> {
    req.validate()?;

    let invalid =
        || ApiError::Unauthorized("No active account found with the given credentials".to_string());

    let user = state
        .store
        .find_user_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    tracing::debug!(user_id = %user.id, "Issued token pair");

    Ok(Json(tokens))
}

/// Exchanges a refresh token for a new access token
///
/// # Endpoint
///
/// ```text
/// POST /api/token/refresh
///
/// { "refresh": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401`: Invalid, expired or revoked refresh token, or an access token
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh, state.jwt_secret())?;

    if state.store.is_token_revoked(claims.jti).await? {
        return Err(ApiError::Unauthorized("Token has been revoked".to_string()));
    }

    let access = jwt::access_token_for(&claims, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access }))
}

/// Revokes the access token that authenticated this request
///
/// The body is optional. When it carries a refresh token of the same user,
/// that token is revoked as well. Responds `204 No Content`.
///
/// # Errors
///
/// - `401`: The refresh token is invalid or belongs to someone else
/// - `422`: A body was sent but is not a valid logout request
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let refresh = match body {
        Ok(Json(req)) => req.refresh,
        // No JSON body at all
        Err(JsonRejection::MissingJsonContentType(_)) => None,
        Err(rejection) => return Err(rejection.into()),
    };

    // Validate before revoking anything so a bad body changes nothing
    let refresh_claims = match refresh {
        Some(token) => {
            let claims = jwt::validate_refresh_token(&token, state.jwt_secret())?;
            if claims.sub != auth.user_id {
                return Err(ApiError::Unauthorized(
                    "Refresh token does not belong to the caller".to_string(),
                ));
            }
            Some(claims)
        }
        None => None,
    };

    state
        .store
        .revoke_token(auth.token_id, auth.token_expires_at)
        .await?;

    if let Some(claims) = refresh_claims {
        state
            .store
            .revoke_token(claims.jti, claims.expires_at())
            .await?;
    }

    tracing::info!(user_id = %auth.user_id, token_id = %auth.token_id, "User logged out");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str) -> SignupRequest {
        SignupRequest {
            email: "alice@example.com".to_string(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password: "Correct-Horse-9".to_string(),
            password2: "Correct-Horse-9".to_string(),
        }
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("alice.m+test@corp-1_x").is_ok());
        assert!(validate_username("alice martin").is_err());
        assert!(validate_username("alice/../").is_err());
    }

    #[test]
    fn test_signup_request_validation() {
        assert!(request("alice").validate().is_ok());
        assert!(request("").validate().is_err());
        assert!(request(&"a".repeat(151)).validate().is_err());

        let mut bad_email = request("alice");
        bad_email.email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());
    }
}
