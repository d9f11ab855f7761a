/// Role-based access checks
///
/// Resolution runs in two steps:
///
/// 1. [`resolve_user`] turns a bearer token into a live, active [`User`]
///    by way of the token store.
/// 2. [`require_role`] / [`check_permissions`] decide what that user may do.
///
/// # Access levels
///
/// | Level       | Allowed role slugs     |
/// |-------------|------------------------|
/// | `User`      | any                    |
/// | `Moderator` | `moderator`, `admin`   |
/// | `Admin`     | `admin`                |

use super::session::{SessionError, SessionManager};
use crate::models::role::{RoleSlug, ADMIN_PERMISSION};
use crate::models::user::User;
use sqlx::PgPool;
use tracing::{debug, warn};

/// Authorization errors
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Token missing from the store, expired or malformed
    #[error("not authenticated: {0}")]
    Unauthenticated(#[from] SessionError),

    #[error("user not found")]
    UserNotFound,

    #[error("user account is inactive")]
    Inactive,

    #[error("route requires {0:?} access")]
    InsufficientRole(AccessLevel),

    #[error("not authorized to access this resource")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Access level required by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    User,
    Moderator,
    Admin,
}

impl AccessLevel {
    /// Whether a user holding `slug` meets this level
    pub fn allows(&self, slug: Option<RoleSlug>) -> bool {
        match self {
            AccessLevel::User => true,
            AccessLevel::Moderator => {
                matches!(slug, Some(RoleSlug::Moderator) | Some(RoleSlug::Admin))
            }
            AccessLevel::Admin => matches!(slug, Some(RoleSlug::Admin)),
        }
    }
}

/// Looks up the user behind a bearer token
///
/// # Errors
///
/// - `Unauthenticated` if the token is invalid or unknown to the store
/// - `UserNotFound` if the account is gone or soft-deleted
/// - `Inactive` if the account is disabled
pub async fn resolve_user(
    pool: &PgPool,
    sessions: &SessionManager<'_>,
    token: &str,
) -> Result<User, AuthzError> {
    let record = sessions.authenticate(token).await?;

    let user = User::find_by_email(pool, &record.email)
        .await?
        .ok_or_else(|| {
            warn!(user_id = record.user_id, "Token refers to a missing user");
            AuthzError::UserNotFound
        })?;

    if !user.is_active {
        debug!(user_id = user.id, "Inactive user rejected");
        return Err(AuthzError::Inactive);
    }

    Ok(user)
}

/// Checks a user's role against an access level
pub async fn require_role(pool: &PgPool, user: &User, level: AccessLevel) -> Result<(), AuthzError> {
    if level == AccessLevel::User {
        return Ok(());
    }

    let slug = user.role(pool).await?.map(|role| role.slug);
    if !level.allows(slug) {
        debug!(user_id = user.id, ?level, ?slug, "Role check failed");
        return Err(AuthzError::InsufficientRole(level));
    }

    Ok(())
}

/// Allows acting on `target_id` for the user themself or an admin
pub async fn check_permissions(pool: &PgPool, actor: &User, target_id: i64) -> Result<(), AuthzError> {
    if actor.id == target_id {
        return Ok(());
    }

    if actor.has_permission(pool, ADMIN_PERMISSION).await? {
        return Ok(());
    }

    debug!(actor = actor.id, target_id, "Permission denied");
    Err(AuthzError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_levels() {
        assert!(AccessLevel::User.allows(None));
        assert!(AccessLevel::User.allows(Some(RoleSlug::User)));

        assert!(AccessLevel::Moderator.allows(Some(RoleSlug::Moderator)));
        assert!(AccessLevel::Moderator.allows(Some(RoleSlug::Admin)));
        assert!(!AccessLevel::Moderator.allows(Some(RoleSlug::User)));
        assert!(!AccessLevel::Moderator.allows(None));

        assert!(AccessLevel::Admin.allows(Some(RoleSlug::Admin)));
        assert!(!AccessLevel::Admin.allows(Some(RoleSlug::Moderator)));
    }

    // Role lookups against the database are covered in tests/models_tests.rs
}
