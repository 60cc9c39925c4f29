/// Comment model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description VARCHAR(2000) NOT NULL,
///     issue_id UUID NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
///     author_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A comment on an issue
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub description: String,

    /// Parent issue, from the request path, immutable
    pub issue_id: Uuid,

    pub author_user_id: Uuid,
    pub created_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub description: String,
    pub issue_id: Uuid,
    pub author_user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateComment {
    pub description: Option<String>,
}

const COMMENT_COLUMNS: &str = "id, description, issue_id, author_user_id, created_time";

impl Comment {
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO comments (description, issue_id, author_user_id)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(data.description)
            .bind(data.issue_id)
            .bind(data.author_user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");

        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the comments of one issue, oldest first
    pub async fn list_by_issue(pool: &PgPool, issue_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE issue_id = $1 \
             ORDER BY created_time ASC, id ASC"
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(issue_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateComment,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE comments
            SET description = COALESCE($2, description)
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(data.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
