/// Bearer-token authentication
///
/// Validates the `Authorization: Bearer <access token>` header and rejects
/// tokens revoked by logout. The API's auth layer calls [`authenticate`]
/// and stores the resulting [`AuthContext`] in the request extensions.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use softdesk_shared::auth::middleware::authenticate;
/// use softdesk_shared::store::MemoryStore;
///
/// # async fn example(headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let secret = "at-least-thirty-two-bytes-of-secret!!";
///
/// match authenticate(&headers, secret, &store).await {
///     Ok(auth) => println!("Hello, user {}!", auth.user_id),
///     Err(e) => println!("Rejected: {:?}", e),
/// }
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::store::Store;

/// Identity of the caller, established once per request
///
/// ```
/// use axum::Extension;
/// use softdesk_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// `jti` of the access token that authenticated the request
    pub token_id: Uuid,

    /// When that access token expires
    pub token_expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            token_id: claims.jti,
            token_expires_at: claims.expires_at(),
        }
    }
}

/// Why a request could not be authenticated
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token was revoked by logout
    Revoked,

    /// Revocation lookup failed
    Store(String),
}

/// Extracts the raw token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] / [`AuthError::InvalidFormat`] for a
///   missing or malformed header
/// - [`AuthError::InvalidToken`] for a bad signature, expired token or a
///   refresh token presented as access token
/// - [`AuthError::Revoked`] for a logged-out token
pub async fn authenticate(
    headers: &HeaderMap,
    secret: &str,
    store: &dyn Store,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        JwtError::WrongTokenType { .. } => {
            AuthError::InvalidToken("Access token required".to_string())
        }
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let revoked = store
        .is_token_revoked(claims.jti)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    if revoked {
        tracing::debug!(user_id = %claims.sub, token_id = %claims.jti, "Rejected revoked token");
        return Err(AuthError::Revoked);
    }

    Ok(AuthContext::from_claims(&claims))
}
