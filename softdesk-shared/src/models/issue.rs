/// Issue model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE issue_tag AS ENUM ('BUG', 'TASK', 'IMPROVEMENT');
/// CREATE TYPE issue_priority AS ENUM ('HIGH', 'MEDIUM', 'LOW');
/// CREATE TYPE issue_status AS ENUM ('TODO', 'WORKINPROGRESS', 'DONE', 'ONHOLD');
///
/// CREATE TABLE issues (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(2000) NOT NULL DEFAULT '',
///     tag issue_tag NOT NULL,
///     priority issue_priority NOT NULL,
///     status issue_status NOT NULL,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     author_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assignee_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Whether the assignee belongs to the project is a policy decision and is
/// checked by the caller, not by the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_tag", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueTag {
    Bug,
    Task,
    Improvement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IssuePriority {
    High,
    Medium,
    Low,
}

/// Workflow state
///
/// There is no transition graph: any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueStatus {
    Todo,
    WorkInProgress,
    Done,
    OnHold,
}

/// An issue filed within a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tag: IssueTag,
    pub priority: IssuePriority,
    pub status: IssueStatus,

    /// Owning project, from the request path, immutable
    pub project_id: Uuid,

    /// Creator, fixed at creation
    pub author_user_id: Uuid,

    pub assignee_user_id: Uuid,
    pub created_time: DateTime<Utc>,
}

/// Input for creating an issue
#[derive(Debug, Clone)]
pub struct CreateIssue {
    pub title: String,
    pub description: String,
    pub tag: IssueTag,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub project_id: Uuid,
    pub author_user_id: Uuid,
    pub assignee_user_id: Uuid,
}

/// Input for updating an issue
///
/// Project and author are not updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateIssue {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag: Option<IssueTag>,
    pub priority: Option<IssuePriority>,
    pub status: Option<IssueStatus>,
    pub assignee_user_id: Option<Uuid>,
}

const ISSUE_COLUMNS: &str = "id, title, description, tag, priority, status, project_id, \
                             author_user_id, assignee_user_id, created_time";

impl Issue {
    /// Creates a new issue
    pub async fn create(pool: &PgPool, data: CreateIssue) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO issues (title, description, tag, priority, status,
                                project_id, author_user_id, assignee_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ISSUE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.tag)
            .bind(data.priority)
            .bind(data.status)
            .bind(data.project_id)
            .bind(data.author_user_id)
            .bind(data.assignee_user_id)
            .fetch_one(pool)
            .await
    }

    /// Finds an issue by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = $1");

        sqlx::query_as::<_, Issue>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the issues of one project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE project_id = $1 \
             ORDER BY created_time ASC, id ASC"
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Updates an issue, leaving `None` fields untouched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateIssue,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE issues
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                tag = COALESCE($4, tag),
                priority = COALESCE($5, priority),
                status = COALESCE($6, status),
                assignee_user_id = COALESCE($7, assignee_user_id)
            WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.tag)
            .bind(data.priority)
            .bind(data.status)
            .bind(data.assignee_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes an issue and, by cascade, its comments
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
