/// Database models for SoftDesk
///
/// Each model owns its SQL. The [`crate::store::PgStore`] backend delegates
/// to these functions; the in-memory backend mirrors their semantics.
///
/// # Models
///
/// - `user`: Registered accounts
/// - `project`: Projects, owned by an author
/// - `membership`: Project collaborators (project ↔ user)
/// - `issue`: Issues filed within a project
/// - `comment`: Comments on an issue
/// - `revoked_token`: JWT ids invalidated by logout
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::models::user::{User, CreateUser};
/// use softdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "ada@example.com".to_string(),
///     username: "ada".to_string(),
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod issue;
pub mod membership;
pub mod project;
pub mod revoked_token;
pub mod user;
