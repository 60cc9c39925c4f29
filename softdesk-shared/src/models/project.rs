/// Project model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_type AS ENUM ('BACKEND', 'FRONTEND', 'IOS', 'ANDROID');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(2000) NOT NULL DEFAULT '',
///     project_type project_type NOT NULL,
///     author_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a project cascades to its memberships, issues and (through the
/// issues) their comments.
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::models::project::{Project, CreateProject, ProjectType};
/// use softdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let author = Uuid::new_v4();
///
/// let project = Project::create(&pool, CreateProject {
///     title: "Website".to_string(),
///     description: "Public marketing site".to_string(),
///     project_type: ProjectType::Backend,
///     author_user_id: author,
/// }).await?;
///
/// let visible = Project::list_visible_to(&pool, author).await?;
/// assert!(visible.iter().any(|p| p.id == project.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Platform a project targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectType {
    Backend,
    Frontend,
    Ios,
    Android,
}

/// A project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    /// 1 to 100 characters
    pub title: String,

    /// Up to 2000 characters
    pub description: String,

    #[serde(rename = "type")]
    pub project_type: ProjectType,

    /// Creator, fixed at creation
    pub author_user_id: Uuid,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    pub project_type: ProjectType,

    /// Always the authenticated caller
    pub author_user_id: Uuid,
}

/// Input for updating a project
///
/// `None` fields are left untouched. Author is not updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<ProjectType>,
}

const PROJECT_COLUMNS: &str = "id, title, description, project_type, author_user_id, created_at";

impl Project {
    /// Creates a new project
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO projects (title, description, project_type, author_user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.project_type)
            .bind(data.author_user_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists every project the user authored or is a member of
    ///
    /// Each project appears once even when the user is both author and member.
    /// Ordered by creation time, oldest first.
    pub async fn list_visible_to(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects p
            WHERE p.author_user_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            ORDER BY p.created_at ASC, p.id ASC
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Updates a project
    ///
    /// Returns `None` if the project no longer exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                project_type = COALESCE($4, project_type)
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.project_type)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a project, cascading to members, issues and comments
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_type_serialization() {
        assert_eq!(serde_json::to_string(&ProjectType::Backend).unwrap(), "\"BACKEND\"");
        assert_eq!(serde_json::to_string(&ProjectType::Ios).unwrap(), "\"IOS\"");

        let parsed: ProjectType = serde_json::from_str("\"ANDROID\"").unwrap();
        assert_eq!(parsed, ProjectType::Android);

        assert!(serde_json::from_str::<ProjectType>("\"backend\"").is_err());
    }

    #[test]
    fn test_project_serializes_type_field() {
        let project = Project {
            id: Uuid::new_v4(),
            title: "Website".to_string(),
            description: String::new(),
            project_type: ProjectType::Frontend,
            author_user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["type"], "FRONTEND");
        assert!(json.get("project_type").is_none());
    }
}
