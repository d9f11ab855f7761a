/// Todo model, the sample feature module
///
/// Serves as the template for new feature modules: a validated input struct,
/// a row struct and raw-SQL CRUD with soft delete.

use super::base;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

pub const TODOS_TABLE: &str = "todos";

const TODO_COLUMNS: &str = "id, name, percentage, description, created_at, updated_at, deleted_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    pub id: i64,

    pub name: String,

    /// Completion from 0 to 100
    pub percentage: f64,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

/// Todo fields accepted on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TodoData {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "Percentage must be between 0 and 100"))]
    pub percentage: f64,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

impl Todo {
    pub async fn create(pool: &PgPool, data: TodoData) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (name, percentage, description) VALUES ($1, $2, $3) RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(data.name)
        .bind(data.percentage)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE id = $1 AND deleted_at IS NULL",
            TODO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a todo by id including soft-deleted rows
    pub async fn find_by_id_any(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!("SELECT {} FROM todos WHERE id = $1", TODO_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2",
            TODO_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await
    }

    /// Lists todos including soft-deleted ones, optionally filtered by name
    pub async fn search(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let pattern = search.map(base::like_pattern);
        let filter = r"($1::TEXT IS NULL OR LOWER(name) LIKE $1 ESCAPE '\')";

        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE {} ORDER BY id LIMIT $2 OFFSET $3",
            TODO_COLUMNS, filter
        ))
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM todos WHERE {}", filter))
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

        Ok((todos, count))
    }

    /// Replaces the todo's fields
    pub async fn update(pool: &PgPool, id: i64, data: TodoData) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET name = $2, percentage = $3, description = $4
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.percentage)
        .bind(data.description)
        .fetch_optional(pool)
        .await
    }

    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        base::soft_delete(pool, TODOS_TABLE, id).await
    }

    pub async fn hard_delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        base::hard_delete(pool, TODOS_TABLE, id).await
    }
}
