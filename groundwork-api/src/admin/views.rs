/// Admin view trait and the registered model views
///
/// # View Contract
///
/// Every view:
/// 1. Names itself (`identity` is the URL slug)
/// 2. Lists rows as JSON, soft-deleted ones included, with an optional search
/// 3. Deletes in two stages: soft first, hard on the second delete
///
/// # Example
///
/// ```no_run
/// use groundwork_api::admin::views::{find_view, AdminView};
/// use groundwork_shared::db::pagination::PageParams;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let view = find_view("todos").expect("registered");
/// let page = view.list(&pool, PageParams::default().resolve(10), Some("docs")).await?;
/// println!("{} of {} {}", page.items.len(), page.count, view.name_plural());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use groundwork_shared::db::pagination::{Page, Pagination};
use groundwork_shared::models::base::{self, DeleteOutcome};
use groundwork_shared::models::role::{Permission, Role, PERMISSIONS_TABLE, ROLES_TABLE};
use groundwork_shared::models::todo::{Todo, TODOS_TABLE};
use groundwork_shared::models::user::{User, USERS_TABLE};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

/// Admin view errors
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Failed to serialize row: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type AdminResult<T> = Result<T, AdminError>;

/// A model exposed in the admin console
#[async_trait]
pub trait AdminView: Send + Sync {
    /// URL slug
    fn identity(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn name_plural(&self) -> &'static str;

    /// Grouping in the view index
    fn category(&self) -> &'static str;

    /// Columns shown in listings
    fn columns(&self) -> &'static [&'static str];

    /// Backing table, used for deletes
    fn table(&self) -> &'static str;

    async fn list(
        &self,
        pool: &PgPool,
        window: Pagination,
        search: Option<&str>,
    ) -> AdminResult<Page<Value>>;

    /// Fetches one row, soft-deleted or not
    async fn get(&self, pool: &PgPool, id: i64) -> AdminResult<Option<Value>>;

    /// Soft-deletes a live row or hard-deletes a soft-deleted one
    ///
    /// Returns `None` when no row has the id.
    async fn delete(&self, pool: &PgPool, id: i64) -> AdminResult<Option<DeleteOutcome>> {
        Ok(base::delete_escalating(pool, self.table(), id).await?)
    }
}

fn to_page<T: Serialize>(rows: Vec<T>, count: i64, window: Pagination) -> AdminResult<Page<Value>> {
    let items = rows
        .into_iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, count, window))
}

/// Filters and pages a small table in memory
fn page_in_memory<T: Serialize>(
    rows: Vec<T>,
    window: Pagination,
    matches: impl Fn(&T) -> bool,
) -> AdminResult<Page<Value>> {
    let rows: Vec<T> = rows.into_iter().filter(|row| matches(row)).collect();
    let count = rows.len() as i64;
    let window_rows = rows
        .into_iter()
        .skip(usize::try_from(window.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(window.limit()).unwrap_or(0))
        .collect();
    to_page(window_rows, count, window)
}

fn contains(haystack: &str, needle: Option<&str>) -> bool {
    needle.map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

fn to_value<T: Serialize>(row: Option<T>) -> AdminResult<Option<Value>> {
    Ok(row.map(serde_json::to_value).transpose()?)
}

pub struct UsersView;

#[async_trait]
impl AdminView for UsersView {
    fn identity(&self) -> &'static str {
        "users"
    }

    fn name(&self) -> &'static str {
        "User"
    }

    fn name_plural(&self) -> &'static str {
        "Users"
    }

    fn category(&self) -> &'static str {
        "Users"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["id", "name", "email", "username", "is_active", "deleted_at"]
    }

    fn table(&self) -> &'static str {
        USERS_TABLE
    }

    async fn list(
        &self,
        pool: &PgPool,
        window: Pagination,
        search: Option<&str>,
    ) -> AdminResult<Page<Value>> {
        let (users, count) = User::search(pool, search, window.limit(), window.offset()).await?;
        to_page(users, count, window)
    }

    async fn get(&self, pool: &PgPool, id: i64) -> AdminResult<Option<Value>> {
        to_value(User::find_by_id_any(pool, id).await?)
    }
}

pub struct RolesView;

#[async_trait]
impl AdminView for RolesView {
    fn identity(&self) -> &'static str {
        "roles"
    }

    fn name(&self) -> &'static str {
        "Role"
    }

    fn name_plural(&self) -> &'static str {
        "Roles"
    }

    fn category(&self) -> &'static str {
        "Roles"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["id", "slug", "title", "deleted_at"]
    }

    fn table(&self) -> &'static str {
        ROLES_TABLE
    }

    async fn list(
        &self,
        pool: &PgPool,
        window: Pagination,
        search: Option<&str>,
    ) -> AdminResult<Page<Value>> {
        let roles = Role::list(pool, true).await?;
        page_in_memory(roles, window, |role| {
            contains(role.slug.as_str(), search) || contains(&role.title, search)
        })
    }

    async fn get(&self, pool: &PgPool, id: i64) -> AdminResult<Option<Value>> {
        to_value(Role::find_by_id_any(pool, id).await?)
    }
}

pub struct PermissionsView;

#[async_trait]
impl AdminView for PermissionsView {
    fn identity(&self) -> &'static str {
        "permissions"
    }

    fn name(&self) -> &'static str {
        "Permission"
    }

    fn name_plural(&self) -> &'static str {
        "Permissions"
    }

    fn category(&self) -> &'static str {
        "Roles"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["id", "permission", "deleted_at"]
    }

    fn table(&self) -> &'static str {
        PERMISSIONS_TABLE
    }

    async fn list(
        &self,
        pool: &PgPool,
        window: Pagination,
        search: Option<&str>,
    ) -> AdminResult<Page<Value>> {
        let permissions = Permission::list(pool, true).await?;
        page_in_memory(permissions, window, |p| contains(&p.permission, search))
    }

    async fn get(&self, pool: &PgPool, id: i64) -> AdminResult<Option<Value>> {
        let permission = Permission::list(pool, true)
            .await?
            .into_iter()
            .find(|p| p.id == id);
        to_value(permission)
    }
}

pub struct TodosView;

#[async_trait]
impl AdminView for TodosView {
    fn identity(&self) -> &'static str {
        "todos"
    }

    fn name(&self) -> &'static str {
        "Todo"
    }

    fn name_plural(&self) -> &'static str {
        "Todos"
    }

    fn category(&self) -> &'static str {
        "Todos"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["id", "name", "percentage", "deleted_at"]
    }

    fn table(&self) -> &'static str {
        TODOS_TABLE
    }

    async fn list(
        &self,
        pool: &PgPool,
        window: Pagination,
        search: Option<&str>,
    ) -> AdminResult<Page<Value>> {
        let (todos, count) = Todo::search(pool, search, window.limit(), window.offset()).await?;
        to_page(todos, count, window)
    }

    async fn get(&self, pool: &PgPool, id: i64) -> AdminResult<Option<Value>> {
        to_value(Todo::find_by_id_any(pool, id).await?)
    }
}

/// Every registered view, in index order
pub fn all_views() -> Vec<Box<dyn AdminView>> {
    vec![
        Box::new(UsersView),
        Box::new(RolesView),
        Box::new(PermissionsView),
        Box::new(TodosView),
    ]
}

pub fn find_view(identity: &str) -> Option<Box<dyn AdminView>> {
    all_views().into_iter().find(|view| view.identity() == identity)
}
