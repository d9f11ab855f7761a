/// Roles and permissions
///
/// A role has a fixed slug (`admin`, `moderator`, `user`), a display title
/// and a set of named permissions through the `roles_permissions` join table.
///
/// # Example
///
/// ```no_run
/// use groundwork_shared::models::role::{CreateRole, Role, RoleSlug};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let role = Role::create(&pool, CreateRole {
///     slug: RoleSlug::Moderator,
///     title: "Moderator".to_string(),
///     permissions: vec!["moderator".to_string()],
/// }).await?;
///
/// assert_eq!(Role::permissions(&pool, role.id).await?, vec!["moderator".to_string()]);
/// # Ok(())
/// # }
/// ```

use super::base::{self, deleted_filter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

pub const ROLES_TABLE: &str = "roles_roles";
pub const PERMISSIONS_TABLE: &str = "roles_permission";

/// Permission name that grants access to other users' records
pub const ADMIN_PERMISSION: &str = "admin";

/// Role identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleSlug {
    Admin,
    User,
    Moderator,
}

impl RoleSlug {
    pub const ALL: [RoleSlug; 3] = [RoleSlug::Admin, RoleSlug::Moderator, RoleSlug::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleSlug::Admin => "admin",
            RoleSlug::User => "user",
            RoleSlug::Moderator => "moderator",
        }
    }
}

impl fmt::Display for RoleSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role slug
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown role slug '{0}'")]
pub struct UnknownRoleSlug(pub String);

impl FromStr for RoleSlug {
    type Err = UnknownRoleSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(RoleSlug::Admin),
            "user" => Ok(RoleSlug::User),
            "moderator" => Ok(RoleSlug::Moderator),
            other => Err(UnknownRoleSlug(other.to_string())),
        }
    }
}

impl TryFrom<String> for RoleSlug {
    type Error = UnknownRoleSlug;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Role row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,

    #[sqlx(try_from = "String")]
    pub slug: RoleSlug,

    pub title: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

/// Permission row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i64,

    pub permission: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub slug: RoleSlug,
    pub title: String,
    /// Permission names, created on demand
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Partial role update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    pub title: Option<String>,
    /// Replaces the permission set when present
    pub permissions: Option<Vec<String>>,
}

/// Role creation errors
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("role '{0}' already exists")]
    AlreadyExists(RoleSlug),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const ROLE_COLUMNS: &str = "id, slug, title, created_at, updated_at, deleted_at";

impl Role {
    /// Creates a role, reviving a soft-deleted role with the same slug
    ///
    /// # Errors
    ///
    /// Returns `RoleError::AlreadyExists` if a live role has the slug
    pub async fn create(pool: &PgPool, data: CreateRole) -> Result<Self, RoleError> {
        let role = match Self::find_by_slug_any(pool, data.slug).await? {
            Some(existing) if existing.deleted_at.is_none() => {
                return Err(RoleError::AlreadyExists(data.slug));
            }
            Some(existing) => {
                tracing::info!(slug = %data.slug, "Restoring soft-deleted role");
                sqlx::query_as::<_, Role>(&format!(
                    "UPDATE roles_roles SET deleted_at = NULL, title = $2
                     WHERE id = $1 RETURNING {}",
                    ROLE_COLUMNS
                ))
                .bind(existing.id)
                .bind(&data.title)
                .fetch_one(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Role>(&format!(
                    "INSERT INTO roles_roles (slug, title) VALUES ($1, $2) RETURNING {}",
                    ROLE_COLUMNS
                ))
                .bind(data.slug.as_str())
                .bind(&data.title)
                .fetch_one(pool)
                .await?
            }
        };

        Self::set_permissions(pool, role.id, &data.permissions).await?;
        Ok(role)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles_roles WHERE id = $1 AND deleted_at IS NULL",
            ROLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a live role by slug
    pub async fn find_by_slug(pool: &PgPool, slug: RoleSlug) -> Result<Option<Self>, sqlx::Error> {
        Ok(Self::find_by_slug_any(pool, slug)
            .await?
            .filter(|role| role.deleted_at.is_none()))
    }

    async fn find_by_slug_any(pool: &PgPool, slug: RoleSlug) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles_roles WHERE slug = $1",
            ROLE_COLUMNS
        ))
        .bind(slug.as_str())
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, allow_deleted: bool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles_roles WHERE {} ORDER BY id",
            ROLE_COLUMNS,
            deleted_filter(allow_deleted)
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool, allow_deleted: bool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM roles_roles WHERE {}",
            deleted_filter(allow_deleted)
        ))
        .fetch_one(pool)
        .await
    }

    /// Finds a role by id including soft-deleted rows
    pub async fn find_by_id_any(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles_roles WHERE id = $1",
            ROLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i64, data: UpdateRole) -> Result<Option<Self>, sqlx::Error> {
        let role = match data.title {
            Some(title) => {
                sqlx::query_as::<_, Role>(&format!(
                    "UPDATE roles_roles SET title = $2
                     WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
                    ROLE_COLUMNS
                ))
                .bind(id)
                .bind(title)
                .fetch_optional(pool)
                .await?
            }
            None => Self::find_by_id(pool, id).await?,
        };

        if let (Some(role), Some(permissions)) = (&role, data.permissions) {
            Self::set_permissions(pool, role.id, &permissions).await?;
        }

        Ok(role)
    }

    /// Replaces the role's permissions, creating unknown permission names
    pub async fn set_permissions(
        pool: &PgPool,
        role_id: i64,
        permissions: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM roles_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for name in permissions {
            let permission_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO roles_permission (permission) VALUES ($1)
                ON CONFLICT (permission) DO UPDATE SET deleted_at = NULL
                RETURNING id
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO roles_permissions (role_id, permission_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// Names of the role's live permissions
    pub async fn permissions(pool: &PgPool, role_id: i64) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT p.permission
            FROM roles_permission p
            JOIN roles_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1 AND p.deleted_at IS NULL
            ORDER BY p.permission
            "#,
        )
        .bind(role_id)
        .fetch_all(pool)
        .await
    }

    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        base::soft_delete(pool, ROLES_TABLE, id).await
    }

    pub async fn hard_delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        base::hard_delete(pool, ROLES_TABLE, id).await
    }
}

impl Permission {
    /// Returns the permission with `name`, creating or reviving it
    pub async fn find_or_create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO roles_permission (permission) VALUES ($1)
            ON CONFLICT (permission) DO UPDATE SET deleted_at = NULL
            RETURNING id, permission, created_at, updated_at, deleted_at
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool, allow_deleted: bool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(&format!(
            "SELECT id, permission, created_at, updated_at, deleted_at
             FROM roles_permission WHERE {} ORDER BY permission",
            deleted_filter(allow_deleted)
        ))
        .fetch_all(pool)
        .await
    }
}
