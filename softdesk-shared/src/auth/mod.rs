/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and password policy
/// - [`jwt`]: JWT access/refresh token generation and validation
/// - [`middleware`]: Per-request authentication context
/// - [`authorization`]: The project-scoped access policy
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::auth::password::{hash_password, verify_password};
/// use softdesk_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
