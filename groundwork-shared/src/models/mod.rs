/// Database models
///
/// Every model maps a table with `sqlx::FromRow` and raw SQL. Tables share
/// the base columns `id`, `created_at`, `updated_at` and `deleted_at`.
///
/// # Models
///
/// - `user`: accounts, login lookup, permissions through roles
/// - `role`: roles, permissions and their join table
/// - `todo`: sample feature module
/// - `base`: soft/hard delete shared by all tables
///
/// # Example
///
/// ```no_run
/// use groundwork_shared::models::todo::{Todo, TodoData};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let todo = Todo::create(&pool, TodoData {
///     name: "Write docs".to_string(),
///     percentage: 0.0,
///     description: None,
/// }).await?;
///
/// Todo::soft_delete(&pool, todo.id).await?;
/// assert!(Todo::find_by_id(&pool, todo.id).await?.is_none());
/// # Ok(())
/// # }
/// ```

pub mod base;
pub mod role;
pub mod todo;
pub mod user;
