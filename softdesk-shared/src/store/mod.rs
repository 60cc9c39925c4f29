/// Persistence seam
///
/// Handlers and the scoping layer talk to a [`Store`] rather than to a
/// connection pool, so the whole HTTP surface can run against either
/// backend:
///
/// - [`PgStore`]: PostgreSQL through sqlx, delegating to [`crate::models`]
/// - [`MemoryStore`]: `RwLock`-guarded maps, for tests and local demos
///
/// Both backends enforce the same constraints (unique email/username,
/// one membership row per pair) and the same cascade
/// Project → Issue → Comment.
///
/// # Example
///
/// ```
/// use softdesk_shared::store::{MemoryStore, Store};
/// use softdesk_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store.create_user(CreateUser {
///     email: "ada@example.com".to_string(),
///     username: "ada".to_string(),
///     first_name: String::new(),
///     last_name: String::new(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// assert!(store.find_user_by_username("ada").await?.is_some());
/// # let _ = user;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::comment::{Comment, CreateComment, UpdateComment};
use crate::models::issue::{CreateIssue, Issue, UpdateIssue};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::user::{CreateUser, User};

/// Unique index on `LOWER(users.email)`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Unique index on `users.username`
pub const USERS_USERNAME_KEY: &str = "users_username_key";

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A referenced row does not exist
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// The input field a unique violation is about, if recognisable
    pub fn conflicting_field(&self) -> Option<&'static str> {
        match self {
            StoreError::UniqueViolation { constraint } if constraint == USERS_EMAIL_KEY => {
                Some("email")
            }
            StoreError::UniqueViolation { constraint } if constraint == USERS_USERNAME_KEY => {
                Some("username")
            }
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();

            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation { constraint };
            }
        }

        StoreError::Database(err)
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the API
///
/// Lookups return `Ok(None)` for missing rows; mutations that target a row
/// by id report whether it existed.
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Case-insensitive
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // Projects

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Projects the user authored or is a member of, each once
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn update_project(&self, id: Uuid, data: UpdateProject)
        -> StoreResult<Option<Project>>;

    /// Deletes the project with its members, issues and comments
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    // Membership

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<User>>;
    async fn member_ids(&self, project_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Returns `false` when the user already was a member
    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Returns `false` when the user was not a member
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    // Issues

    async fn create_issue(&self, data: CreateIssue) -> StoreResult<Issue>;
    async fn find_issue(&self, id: Uuid) -> StoreResult<Option<Issue>>;
    async fn list_issues(&self, project_id: Uuid) -> StoreResult<Vec<Issue>>;
    async fn update_issue(&self, id: Uuid, data: UpdateIssue) -> StoreResult<Option<Issue>>;

    /// Deletes the issue with its comments
    async fn delete_issue(&self, id: Uuid) -> StoreResult<bool>;

    // Comments

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment>;
    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;
    async fn list_comments(&self, issue_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn update_comment(&self, id: Uuid, data: UpdateComment)
        -> StoreResult<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;

    // Token revocation

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()>;
    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool>;

    /// Drops revocation entries for tokens that have expired anyway
    async fn purge_revoked_tokens(&self) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_field() {
        let email = StoreError::UniqueViolation {
            constraint: USERS_EMAIL_KEY.to_string(),
        };
        let username = StoreError::UniqueViolation {
            constraint: USERS_USERNAME_KEY.to_string(),
        };
        let other = StoreError::UniqueViolation {
            constraint: "something_else".to_string(),
        };

        assert_eq!(email.conflicting_field(), Some("email"));
        assert_eq!(username.conflicting_field(), Some("username"));
        assert_eq!(other.conflicting_field(), None);
    }

    #[test]
    fn test_non_database_errors_stay_generic() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
