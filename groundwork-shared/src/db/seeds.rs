/// Database seeding
///
/// Seeds run in dependency order: permissions, roles, users, todos. Every
/// seed can be re-run without duplicating rows.

use crate::models::role::{CreateRole, Permission, Role, RoleError, RoleSlug};
use crate::models::todo::{Todo, TodoData};
use crate::models::user::{CreateUser, User, UserError};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const PERMISSIONS: [&str; 3] = ["admin", "moderator", "user"];

/// Seeded roles: slug, title and permission names
pub const ROLES: [(RoleSlug, &str, &str); 3] = [
    (RoleSlug::Admin, "Administrator", "admin"),
    (RoleSlug::Moderator, "Moderator", "moderator"),
    (RoleSlug::User, "User", "user"),
];

const SAMPLE_TODOS: [(&str, f64, &str); 3] = [
    ("Read the README", 100.0, "Get to know the project layout"),
    ("Create a feature module", 50.0, "Run `groundwork new-module <name>`"),
    ("Write tests", 0.0, "Cover the new module's endpoints"),
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("unknown seed '{0}', expected one of: all, permissions, roles, users, todos")]
    Unknown(String),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A seed target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    All,
    Permissions,
    Roles,
    Users,
    Todos,
}

impl Seed {
    /// Individual seeds in the order `all` runs them
    pub const ORDER: [Seed; 4] = [Seed::Permissions, Seed::Roles, Seed::Users, Seed::Todos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Seed::All => "all",
            Seed::Permissions => "permissions",
            Seed::Roles => "roles",
            Seed::Users => "users",
            Seed::Todos => "todos",
        }
    }

    /// The individual seeds this target expands to
    pub fn expand(&self) -> Vec<Seed> {
        match self {
            Seed::All => Self::ORDER.to_vec(),
            seed => vec![*seed],
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Seed {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Seed::All),
            "permissions" => Ok(Seed::Permissions),
            "roles" => Ok(Seed::Roles),
            "users" => Ok(Seed::Users),
            "todos" => Ok(Seed::Todos),
            _ => Err(SeedError::Unknown(s.to_string())),
        }
    }
}

/// Credentials of the seeded admin account
#[derive(Clone)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccount")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Runs `seed`, expanding `all`
pub async fn run_seeds(
    pool: &PgPool,
    seed: Seed,
    admin: Option<&AdminAccount>,
) -> Result<(), SeedError> {
    let seeds = seed.expand();
    info!(count = seeds.len(), seeds = %seed, "Running seeds");

    for seed in seeds {
        debug!(seed = %seed, "Running seed");
        match seed {
            Seed::Permissions => seed_permissions(pool).await?,
            Seed::Roles => seed_roles(pool).await?,
            Seed::Users => seed_users(pool, admin).await?,
            Seed::Todos => seed_todos(pool).await?,
            // expanded above
            Seed::All => {}
        }
    }

    info!(seeds = %seed, "Seeds completed");
    Ok(())
}

pub async fn seed_permissions(pool: &PgPool) -> Result<(), SeedError> {
    for name in PERMISSIONS {
        Permission::find_or_create(pool, name).await?;
    }
    info!(count = PERMISSIONS.len(), "Seeded permissions");
    Ok(())
}

/// Creates missing roles; existing roles keep their title and permissions
pub async fn seed_roles(pool: &PgPool) -> Result<(), SeedError> {
    let mut created = 0;

    for (slug, title, permission) in ROLES {
        if Role::find_by_slug(pool, slug).await?.is_some() {
            debug!(slug = %slug, "Role already present");
            continue;
        }

        let role = Role::create(
            pool,
            CreateRole {
                slug,
                title: title.to_string(),
                permissions: vec![permission.to_string()],
            },
        )
        .await?;
        debug!(role_id = role.id, slug = %slug, "Role created");
        created += 1;
    }

    info!(created, "Seeded roles");
    Ok(())
}

/// Creates the admin account if configured and absent
pub async fn seed_users(pool: &PgPool, admin: Option<&AdminAccount>) -> Result<(), SeedError> {
    let Some(admin) = admin else {
        warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin user");
        return Ok(());
    };

    if User::find_by_email(pool, &admin.email).await?.is_some() {
        debug!(email = %admin.email, "Admin user already present");
        return Ok(());
    }

    let role_id = Role::find_by_slug(pool, RoleSlug::Admin).await?.map(|role| role.id);
    if role_id.is_none() {
        warn!("Admin role missing, run the roles seed first");
    }

    let user = User::create(
        pool,
        CreateUser {
            name: "Site Administrator".to_string(),
            email: admin.email.clone(),
            username: None,
            password: admin.password.clone(),
            role_id,
        },
    )
    .await?;

    info!(user_id = user.id, "Seeded admin user");
    Ok(())
}

/// Adds the sample todos when the table is empty
pub async fn seed_todos(pool: &PgPool) -> Result<(), SeedError> {
    if Todo::count(pool).await? > 0 {
        debug!("Todos already present");
        return Ok(());
    }

    for (name, percentage, description) in SAMPLE_TODOS {
        Todo::create(
            pool,
            TodoData {
                name: name.to_string(),
                percentage,
                description: Some(description.to_string()),
            },
        )
        .await?;
    }

    info!(count = SAMPLE_TODOS.len(), "Seeded todos");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed() {
        assert_eq!("all".parse::<Seed>().unwrap(), Seed::All);
        assert_eq!("Users".parse::<Seed>().unwrap(), Seed::Users);

        let err = "widgets".parse::<Seed>().unwrap_err();
        assert!(err.to_string().contains("permissions, roles, users, todos"));
    }

    #[test]
    fn test_all_expands_in_dependency_order() {
        assert_eq!(
            Seed::All.expand(),
            vec![Seed::Permissions, Seed::Roles, Seed::Users, Seed::Todos]
        );
        assert_eq!(Seed::Roles.expand(), vec![Seed::Roles]);
    }

    #[test]
    fn test_roles_reference_seeded_permissions() {
        for (_, _, permission) in ROLES {
            assert!(PERMISSIONS.contains(&permission));
        }
    }

    #[test]
    fn test_admin_account_debug_redacts_password() {
        let admin = AdminAccount {
            email: "admin@example.com".into(),
            password: "secret123".into(),
        };
        assert!(!format!("{:?}", admin).contains("secret123"));
    }
}
