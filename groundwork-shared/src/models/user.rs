/// User model and database operations
///
/// Users log in with their username or email. Passwords are stored as
/// Argon2id hashes and never leave this module in serialized form: the
/// `password` field is skipped by serde and [`UserPublic`] is the shape
/// returned by the API.
///
/// # Example
///
/// ```no_run
/// use groundwork_shared::models::user::{CreateUser, User};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     username: Some("jane".to_string()),
///     password: "s3cret-pass".to_string(),
///     role_id: None,
/// }).await?;
///
/// let found = User::find_by_login(&pool, "jane").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use super::base;
use super::role::{Role, RoleSlug, ADMIN_PERMISSION};
use crate::auth::password::{hash_password, PasswordError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

pub const USERS_TABLE: &str = "users";

const USER_COLUMNS: &str =
    "id, name, email, username, password, is_active, role_id, created_at, updated_at, deleted_at";

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email address, also accepted as login
    pub email: String,

    /// Optional unique login name
    pub username: Option<String>,

    /// Argon2id PHC hash
    #[serde(skip_serializing, default)]
    pub password: String,

    /// Inactive users cannot log in
    pub is_active: bool,

    pub role_id: Option<i64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

/// User as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub is_active: bool,
    pub role_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            is_active: user.is_active,
            role_id: user.role_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for creating a user; `password` is plaintext and hashed on insert
#[derive(Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    /// Defaults to the `user` role when absent
    pub role_id: Option<i64>,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}

/// Partial user update; `password` is plaintext and hashed on update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,

    pub email: Option<String>,

    /// `Some(None)` clears the username
    pub username: Option<Option<String>>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    pub is_active: Option<bool>,

    pub role_id: Option<i64>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.is_active.is_none()
            && self.role_id.is_none()
    }
}

/// User persistence errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl User {
    /// Inserts a user, hashing the password and defaulting to the `user` role
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, UserError> {
        let password_hash = hash_password(&data.password)?;

        let role_id = match data.role_id {
            Some(id) => Some(id),
            None => Role::find_by_slug(pool, RoleSlug::User).await?.map(|r| r.id),
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, username, password, role_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(data.name)
        .bind(data.email.to_lowercase())
        .bind(data.username)
        .bind(password_hash)
        .bind(role_id)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by id including soft-deleted rows
    pub async fn find_by_id_any(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by username or email, as accepted at login
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users
             WHERE (username = $1 OR email = LOWER($1)) AND deleted_at IS NULL
             ORDER BY (username = $1) DESC NULLS LAST
             LIMIT 1",
            USER_COLUMNS
        ))
        .bind(login)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by numeric id, email or username
    pub async fn find_by_identifier(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        if let Ok(id) = identifier.parse::<i64>() {
            if let Some(user) = Self::find_by_id(pool, id).await? {
                return Ok(Some(user));
            }
        }
        Self::find_by_login(pool, identifier).await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL
             ORDER BY id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Lists users including soft-deleted ones, optionally filtered by a
    /// case-insensitive match on name, email or username
    pub async fn search(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let pattern = search.map(base::like_pattern);
        let filter = r"($1::TEXT IS NULL
                       OR LOWER(name) LIKE $1 ESCAPE '\'
                       OR LOWER(email) LIKE $1 ESCAPE '\'
                       OR LOWER(COALESCE(username, '')) LIKE $1 ESCAPE '\')";

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE {} ORDER BY id LIMIT $2 OFFSET $3",
            USER_COLUMNS, filter
        ))
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {}", filter))
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

        Ok((users, count))
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await
    }

    /// Applies a partial update, hashing a new password if one is given
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, UserError> {
        let password_hash = data.password.as_deref().map(hash_password).transpose()?;

        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }
        if data.role_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role_id = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            USER_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email.to_lowercase());
        }
        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(hash) = password_hash {
            q = q.bind(hash);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }
        if let Some(role_id) = data.role_id {
            q = q.bind(role_id);
        }

        Ok(q.fetch_optional(pool).await?)
    }

    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        base::soft_delete(pool, USERS_TABLE, id).await
    }

    pub async fn hard_delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        base::hard_delete(pool, USERS_TABLE, id).await
    }

    /// The user's role, if assigned and live
    pub async fn role(&self, pool: &PgPool) -> Result<Option<Role>, sqlx::Error> {
        match self.role_id {
            Some(role_id) => Role::find_by_id(pool, role_id).await,
            None => Ok(None),
        }
    }

    /// Names of the permissions granted through the user's role
    pub async fn permissions(&self, pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        match self.role_id {
            Some(role_id) => Role::permissions(pool, role_id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn has_permission(&self, pool: &PgPool, permission: &str) -> Result<bool, sqlx::Error> {
        Ok(self.permissions(pool).await?.iter().any(|p| p == permission))
    }

    pub async fn is_admin(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        self.has_permission(pool, ADMIN_PERMISSION).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            username: Some("jane".to_string()),
            password: "$argon2id$v=19$secret".to_string(),
            is_active: true,
            role_id: Some(2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_password_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "jane@example.com");

        let public = serde_json::to_value(UserPublic::from(sample_user())).unwrap();
        assert!(public.get("password").is_none());
        assert!(public.get("deleted_at").is_none());
    }

    #[test]
    fn test_create_user_debug_hides_password() {
        let create = CreateUser {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            username: None,
            password: "hunter22".to_string(),
            role_id: None,
        };
        assert!(!format!("{:?}", create).contains("hunter22"));
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.is_empty());

        let update = UpdateUser {
            username: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    // Integration tests for database operations are in tests/models_tests.rs
}
