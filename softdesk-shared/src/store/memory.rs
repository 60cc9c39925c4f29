/// In-memory store
///
/// Keeps every table in insertion order behind a single `RwLock`, so each
/// operation is atomic with respect to the others. Constraint and cascade
/// behaviour mirrors the PostgreSQL schema, including the constraint names
/// reported in [`StoreError`].
///
/// Used by the test suites and for running the API without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, USERS_EMAIL_KEY, USERS_USERNAME_KEY};
use crate::models::comment::{Comment, CreateComment, UpdateComment};
use crate::models::issue::{CreateIssue, Issue, UpdateIssue};
use crate::models::membership::ProjectMember;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    issues: Vec<Issue>,
    comments: Vec<Comment>,
    revoked_tokens: HashMap<Uuid, DateTime<Utc>>,
}

impl Tables {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn project_exists(&self, id: Uuid) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    fn issue_exists(&self, id: Uuid) -> bool {
        self.issues.iter().any(|i| i.id == id)
    }

    /// Removes an issue and its comments
    fn delete_issue_cascade(&mut self, id: Uuid) -> bool {
        let before = self.issues.len();
        self.issues.retain(|i| i.id != id);
        let deleted = self.issues.len() < before;

        if deleted {
            self.comments.retain(|c| c.issue_id != id);
        }

        deleted
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

fn require(condition: bool, constraint: &str) -> StoreResult<()> {
    if condition {
        Ok(())
    } else {
        Err(foreign_key(constraint))
    }
}

/// [`Store`] backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .iter()
            .any(|u| u.email.to_lowercase() == data.email.to_lowercase())
        {
            return Err(StoreError::UniqueViolation {
                constraint: USERS_EMAIL_KEY.to_string(),
            });
        }

        if tables.users.iter().any(|u| u.username == data.username) {
            return Err(StoreError::UniqueViolation {
                constraint: USERS_USERNAME_KEY.to_string(),
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            username: data.username,
            first_name: data.first_name,
            last_name: data.last_name,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };

        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        require(
            tables.user_exists(data.author_user_id),
            "projects_author_user_id_fkey",
        )?;

        let project = Project {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            project_type: data.project_type,
            author_user_id: data.author_user_id,
            created_at: Utc::now(),
        };

        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;

        Ok(tables
            .projects
            .iter()
            .filter(|p| {
                p.author_user_id == user_id
                    || tables
                        .members
                        .iter()
                        .any(|m| m.project_id == p.id && m.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn update_project(
        &self,
        id: Uuid,
        data: UpdateProject,
    ) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;

        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(title) = data.title {
            project.title = title;
        }
        if let Some(description) = data.description {
            project.description = description;
        }
        if let Some(project_type) = data.project_type {
            project.project_type = project_type;
        }

        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        if tables.projects.len() == before {
            return Ok(false);
        }

        tables.members.retain(|m| m.project_id != id);

        let issue_ids: Vec<Uuid> = tables
            .issues
            .iter()
            .filter(|i| i.project_id == id)
            .map(|i| i.id)
            .collect();
        for issue_id in issue_ids {
            tables.delete_issue_cascade(issue_id);
        }

        Ok(true)
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;

        Ok(tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| tables.users.iter().find(|u| u.id == m.user_id))
            .cloned()
            .collect())
    }

    async fn member_ids(&self, project_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;

        Ok(tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| m.user_id)
            .collect())
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id))
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        require(
            tables.project_exists(project_id),
            "project_members_project_id_fkey",
        )?;
        require(tables.user_exists(user_id), "project_members_user_id_fkey")?;

        if tables
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
        {
            return Ok(false);
        }

        tables.members.push(ProjectMember {
            project_id,
            user_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.members.len();
        tables
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));

        Ok(tables.members.len() < before)
    }

    async fn create_issue(&self, data: CreateIssue) -> StoreResult<Issue> {
        let mut tables = self.tables.write().await;
        require(
            tables.project_exists(data.project_id),
            "issues_project_id_fkey",
        )?;
        require(
            tables.user_exists(data.author_user_id),
            "issues_author_user_id_fkey",
        )?;
        require(
            tables.user_exists(data.assignee_user_id),
            "issues_assignee_user_id_fkey",
        )?;

        let issue = Issue {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            tag: data.tag,
            priority: data.priority,
            status: data.status,
            project_id: data.project_id,
            author_user_id: data.author_user_id,
            assignee_user_id: data.assignee_user_id,
            created_time: Utc::now(),
        };

        tables.issues.push(issue.clone());
        Ok(issue)
    }

    async fn find_issue(&self, id: Uuid) -> StoreResult<Option<Issue>> {
        let tables = self.tables.read().await;
        Ok(tables.issues.iter().find(|i| i.id == id).cloned())
    }

    async fn list_issues(&self, project_id: Uuid) -> StoreResult<Vec<Issue>> {
        let tables = self.tables.read().await;
        Ok(tables
            .issues
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_issue(&self, id: Uuid, data: UpdateIssue) -> StoreResult<Option<Issue>> {
        let mut tables = self.tables.write().await;

        if let Some(assignee) = data.assignee_user_id {
            require(tables.user_exists(assignee), "issues_assignee_user_id_fkey")?;
        }

        let Some(issue) = tables.issues.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };

        if let Some(title) = data.title {
            issue.title = title;
        }
        if let Some(description) = data.description {
            issue.description = description;
        }
        if let Some(tag) = data.tag {
            issue.tag = tag;
        }
        if let Some(priority) = data.priority {
            issue.priority = priority;
        }
        if let Some(status) = data.status {
            issue.status = status;
        }
        if let Some(assignee) = data.assignee_user_id {
            issue.assignee_user_id = assignee;
        }

        Ok(Some(issue.clone()))
    }

    async fn delete_issue(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.delete_issue_cascade(id))
    }

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment> {
        let mut tables = self.tables.write().await;
        require(tables.issue_exists(data.issue_id), "comments_issue_id_fkey")?;
        require(
            tables.user_exists(data.author_user_id),
            "comments_author_user_id_fkey",
        )?;

        let comment = Comment {
            id: Uuid::new_v4(),
            description: data.description,
            issue_id: data.issue_id,
            author_user_id: data.author_user_id,
            created_time: Utc::now(),
        };

        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, issue_id: Uuid) -> StoreResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.issue_id == issue_id)
            .cloned()
            .collect())
    }

    async fn update_comment(
        &self,
        id: Uuid,
        data: UpdateComment,
    ) -> StoreResult<Option<Comment>> {
        let mut tables = self.tables.write().await;

        let Some(comment) = tables.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(description) = data.description {
            comment.description = description;
        }

        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.revoked_tokens.entry(jti).or_insert(expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.revoked_tokens.contains_key(&jti))
    }

    async fn purge_revoked_tokens(&self) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let before = tables.revoked_tokens.len();
        tables.revoked_tokens.retain(|_, expires_at| *expires_at >= now);
        Ok((before - tables.revoked_tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectType;
    use chrono::Duration;

    fn new_user(name: &str) -> CreateUser {
        CreateUser {
            email: format!("{name}@example.com"),
            username: name.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_email_uniqueness_ignores_case() {
        let store = MemoryStore::new();
        store.create_user(new_user("ada")).await.unwrap();

        let mut duplicate = new_user("ada2");
        duplicate.email = "ADA@Example.com".to_string();

        let err = store.create_user(duplicate).await.unwrap_err();
        assert_eq!(err.conflicting_field(), Some("email"));
    }

    #[tokio::test]
    async fn test_username_uniqueness() {
        let store = MemoryStore::new();
        store.create_user(new_user("ada")).await.unwrap();

        let mut duplicate = new_user("ada");
        duplicate.email = "other@example.com".to_string();

        let err = store.create_user(duplicate).await.unwrap_err();
        assert_eq!(err.conflicting_field(), Some("username"));
    }

    #[tokio::test]
    async fn test_project_requires_existing_author() {
        let store = MemoryStore::new();

        let err = store
            .create_project(CreateProject {
                title: "Orphan".to_string(),
                description: String::new(),
                project_type: ProjectType::Backend,
                author_user_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_purge_only_drops_expired_entries() {
        let store = MemoryStore::new();
        let live = Uuid::new_v4();
        let stale = Uuid::new_v4();

        store
            .revoke_token(live, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .revoke_token(stale, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.purge_revoked_tokens().await.unwrap(), 1);
        assert!(store.is_token_revoked(live).await.unwrap());
        assert!(!store.is_token_revoked(stale).await.unwrap());
    }
}
