//! Soft-delete helpers shared by every table.
//!
//! Every table carries `id`, `created_at`, `updated_at` and `deleted_at`.
//! A row with `deleted_at` set is soft-deleted: hidden from default listings
//! but still present until hard-deleted.

use serde::Serialize;
use sqlx::PgPool;

/// Result of a two-stage delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Row was live and is now marked deleted
    SoftDeleted,
    /// Row was already soft-deleted and has been removed
    HardDeleted,
}

/// Marks a live row as deleted
///
/// Returns false if the row does not exist or was already soft-deleted.
pub async fn soft_delete(pool: &PgPool, table: &'static str, id: i64) -> Result<bool, sqlx::Error> {
    let query = format!(
        "UPDATE {} SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        table
    );
    let result = sqlx::query(&query).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Removes a row permanently
pub async fn hard_delete(pool: &PgPool, table: &'static str, id: i64) -> Result<bool, sqlx::Error> {
    let query = format!("DELETE FROM {} WHERE id = $1", table);
    let result = sqlx::query(&query).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Soft-deletes a live row, or hard-deletes one that is already soft-deleted
///
/// Returns `None` when no row has the given id.
pub async fn delete_escalating(
    pool: &PgPool,
    table: &'static str,
    id: i64,
) -> Result<Option<DeleteOutcome>, sqlx::Error> {
    let query = format!("SELECT deleted_at IS NOT NULL FROM {} WHERE id = $1", table);
    let already_deleted: Option<bool> = sqlx::query_scalar(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match already_deleted {
        None => Ok(None),
        Some(false) => {
            soft_delete(pool, table, id).await?;
            Ok(Some(DeleteOutcome::SoftDeleted))
        }
        Some(true) => {
            hard_delete(pool, table, id).await?;
            Ok(Some(DeleteOutcome::HardDeleted))
        }
    }
}

/// `WHERE` fragment hiding soft-deleted rows unless `allow_deleted`
pub fn deleted_filter(allow_deleted: bool) -> &'static str {
    if allow_deleted {
        "TRUE"
    } else {
        "deleted_at IS NULL"
    }
}

/// Case-insensitive substring pattern for `LIKE ... ESCAPE '\'`
///
/// `%`, `_` and `\` in the input match literally.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
