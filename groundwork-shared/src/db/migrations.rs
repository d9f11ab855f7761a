/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root and
/// are embedded at compile time. Every migration is reversible:
/// - `{timestamp}_{name}.up.sql` applies the change
/// - `{timestamp}_{name}.down.sql` reverts it
///
/// # Example
///
/// ```no_run
/// use groundwork_shared::db::pool::{create_pool, DatabaseConfig};
/// use groundwork_shared::db::migrations::{run_migrations, get_migration_status};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///
///     let status = get_migration_status(&pool).await?;
///     println!("Applied {} migrations", status.applied_migrations);
///     Ok(())
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::migrate::{MigrateDatabase, MigrateError, Migrator};
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Migrations embedded from `migrations/`
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Migration errors
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("migration failed: {0}")]
    Migrate(#[from] MigrateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to write migration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid migration name: {0}")]
    InvalidName(String),

    #[error("migration file already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// A migration recorded in `_sqlx_migrations`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub installed_on: DateTime<Utc>,
    pub success: bool,
}

/// Migration status information
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,

    /// Embedded migrations not yet applied
    pub pending: Vec<i64>,

    pub applied: Vec<AppliedMigration>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Runs all pending database migrations
///
/// Safe to call repeatedly; already applied migrations are skipped.
///
/// # Errors
///
/// Returns an error if a migration fails to execute or an applied
/// migration no longer matches its embedded checksum.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    info!(
        embedded = MIGRATOR.iter().filter(|m| m.migration_type.is_up_migration()).count(),
        "Starting database migrations"
    );

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}

/// Reverts the newest `steps` applied migrations
///
/// Returns the versions that were reverted, newest first.
pub async fn undo_migrations(pool: &PgPool, steps: usize) -> Result<Vec<i64>, MigrationError> {
    let applied = applied_versions(pool).await?;
    if applied.is_empty() || steps == 0 {
        info!("Nothing to undo");
        return Ok(Vec::new());
    }

    let reverted: Vec<i64> = applied.iter().take(steps).copied().collect();
    let target = undo_target(&applied, steps);

    info!(steps, target, "Reverting migrations");
    MIGRATOR.undo(pool, target).await?;
    info!(reverted = ?reverted, "Migrations reverted");

    Ok(reverted)
}

/// Version to revert down to so that `steps` migrations are undone
///
/// `applied` must be sorted newest first.
fn undo_target(applied: &[i64], steps: usize) -> i64 {
    applied.get(steps).copied().unwrap_or(0)
}

async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>, sqlx::Error> {
    if !migrations_table_exists(pool).await? {
        return Ok(Vec::new());
    }

    sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = true ORDER BY version DESC")
        .fetch_all(pool)
        .await
}

async fn migrations_table_exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await
}

/// Gets the current migration status
///
/// # Errors
///
/// Returns an error if the migrations table cannot be queried
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let applied: Vec<AppliedMigration> = if migrations_table_exists(pool).await? {
        sqlx::query_as(
            "SELECT version, description, installed_on, success
             FROM _sqlx_migrations
             ORDER BY version",
        )
        .fetch_all(pool)
        .await?
    } else {
        debug!("Migrations table does not exist yet");
        Vec::new()
    };

    let applied_versions: Vec<i64> = applied
        .iter()
        .filter(|m| m.success)
        .map(|m| m.version)
        .collect();

    let pending: Vec<i64> = MIGRATOR
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .map(|m| m.version)
        .filter(|v| !applied_versions.contains(v))
        .collect();

    debug!(
        applied_migrations = applied_versions.len(),
        pending = pending.len(),
        "Migration status retrieved"
    );

    Ok(MigrationStatus {
        applied_migrations: applied_versions.len(),
        latest_version: applied_versions.iter().max().copied(),
        pending,
        applied,
    })
}

/// Creates the database if it doesn't exist
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    info!("Checking if database exists");

    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

/// Drops the database and all of its data
///
/// Intended for development and test environments only.
pub async fn drop_database(database_url: &str) -> Result<(), sqlx::Error> {
    warn!("Dropping database");

    if Postgres::database_exists(database_url).await? {
        Postgres::drop_database(database_url).await?;
        info!("Database dropped successfully");
    } else {
        debug!("Database does not exist, nothing to drop");
    }

    Ok(())
}

/// Normalizes a migration message into a file-name slug
///
/// `"Add todo models!"` becomes `"add_todo_models"`.
pub fn migration_slug(message: &str) -> Result<String, MigrationError> {
    let mut slug = String::with_capacity(message.len());
    for ch in message.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_').to_string();

    if slug.is_empty() {
        return Err(MigrationError::InvalidName(message.to_string()));
    }
    Ok(slug)
}

/// Writes an empty reversible migration pair into `dir`
///
/// Returns the `(up, down)` paths.
pub fn create_migration_files(
    dir: &Path,
    message: &str,
    now: DateTime<Utc>,
) -> Result<(PathBuf, PathBuf), MigrationError> {
    let slug = migration_slug(message)?;
    let stem = format!("{}_{}", now.format("%Y%m%d%H%M%S"), slug);

    fs::create_dir_all(dir)?;

    let up = dir.join(format!("{}.up.sql", stem));
    let down = dir.join(format!("{}.down.sql", stem));
    for path in [&up, &down] {
        if path.exists() {
            return Err(MigrationError::AlreadyExists(path.clone()));
        }
    }

    fs::write(&up, format!("-- {}\n", message.trim()))?;
    fs::write(&down, format!("-- Revert: {}\n", message.trim()))?;

    info!(up = %up.display(), down = %down.display(), "Created migration files");
    Ok((up, down))
}
