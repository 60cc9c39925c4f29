/// PostgreSQL store
///
/// Thin adapter from [`Store`] to the model functions in [`crate::models`].
/// Cascades are done by the schema's `ON DELETE CASCADE` foreign keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::db::pool::health_check;
use crate::models::comment::{Comment, CreateComment, UpdateComment};
use crate::models::issue::{CreateIssue, Issue, UpdateIssue};
use crate::models::membership::ProjectMember;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::revoked_token::RevokedToken;
use crate::models::user::{CreateUser, User};

/// [`Store`] backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_visible_to(&self.pool, user_id).await?)
    }

    async fn update_project(
        &self,
        id: Uuid,
        data: UpdateProject,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, data).await?)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<User>> {
        Ok(ProjectMember::list_users(&self.pool, project_id).await?)
    }

    async fn member_ids(&self, project_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(ProjectMember::member_ids(&self.pool, project_id).await?)
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::is_member(&self.pool, project_id, user_id).await?)
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::add(&self.pool, project_id, user_id).await?)
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::remove(&self.pool, project_id, user_id).await?)
    }

    async fn create_issue(&self, data: CreateIssue) -> StoreResult<Issue> {
        Ok(Issue::create(&self.pool, data).await?)
    }

    async fn find_issue(&self, id: Uuid) -> StoreResult<Option<Issue>> {
        Ok(Issue::find_by_id(&self.pool, id).await?)
    }

    async fn list_issues(&self, project_id: Uuid) -> StoreResult<Vec<Issue>> {
        Ok(Issue::list_by_project(&self.pool, project_id).await?)
    }

    async fn update_issue(&self, id: Uuid, data: UpdateIssue) -> StoreResult<Option<Issue>> {
        Ok(Issue::update(&self.pool, id, data).await?)
    }

    async fn delete_issue(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Issue::delete(&self.pool, id).await?)
    }

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment> {
        Ok(Comment::create(&self.pool, data).await?)
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(Comment::find_by_id(&self.pool, id).await?)
    }

    async fn list_comments(&self, issue_id: Uuid) -> StoreResult<Vec<Comment>> {
        Ok(Comment::list_by_issue(&self.pool, issue_id).await?)
    }

    async fn update_comment(
        &self,
        id: Uuid,
        data: UpdateComment,
    ) -> StoreResult<Option<Comment>> {
        Ok(Comment::update(&self.pool, id, data).await?)
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Comment::delete(&self.pool, id).await?)
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        Ok(RevokedToken::revoke(&self.pool, jti, expires_at).await?)
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        Ok(RevokedToken::is_revoked(&self.pool, jti).await?)
    }

    async fn purge_revoked_tokens(&self) -> StoreResult<u64> {
        Ok(RevokedToken::purge_expired(&self.pool).await?)
    }
}
