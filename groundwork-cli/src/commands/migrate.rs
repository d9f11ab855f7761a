//! Migration commands
//!
//! Usage:
//!   groundwork migrate
//!   groundwork undo-migrate [--steps N]
//!   groundwork migration-status
//!   groundwork create-migration <MESSAGE> [--dir migrations]

use super::connect;
use chrono::Utc;
use clap::Args;
use groundwork_shared::db::migrations::{
    create_migration_files, get_migration_status, run_migrations, undo_migrations,
};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct UndoArgs {
    /// Number of migrations to revert
    #[arg(long, default_value_t = 1)]
    pub steps: usize,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Short description, turned into the file name
    pub message: String,

    /// Directory holding the migration files
    #[arg(long, env = "MIGRATIONS_DIR", default_value = "migrations")]
    pub dir: PathBuf,
}

/// Applies pending migrations
pub async fn execute_migrate() -> anyhow::Result<()> {
    let pool = connect().await?;
    run_migrations(&pool).await?;

    let status = get_migration_status(&pool).await?;
    println!(
        "✓ Database is at version {}",
        status
            .latest_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(())
}

pub async fn execute_undo(args: UndoArgs) -> anyhow::Result<()> {
    if args.steps == 0 {
        anyhow::bail!("--steps must be at least 1");
    }

    let pool = connect().await?;
    let reverted = undo_migrations(&pool, args.steps).await?;

    if reverted.is_empty() {
        println!("Nothing to revert");
    }
    for version in reverted {
        println!("✓ Reverted {}", version);
    }
    Ok(())
}

pub async fn execute_status() -> anyhow::Result<()> {
    let pool = connect().await?;
    let status = get_migration_status(&pool).await?;

    for migration in &status.applied {
        println!(
            "  [{}] {} {} ({})",
            if migration.success { "x" } else { "!" },
            migration.version,
            migration.description,
            migration.installed_on.format("%Y-%m-%d %H:%M:%S")
        );
    }
    for version in &status.pending {
        println!("  [ ] {}", version);
    }

    if status.is_up_to_date() {
        println!("✓ Up to date ({} applied)", status.applied_migrations);
    } else {
        println!("{} pending migration(s)", status.pending.len());
    }
    Ok(())
}

/// Writes an empty migration pair; needs no database
pub fn execute_create(args: CreateArgs) -> anyhow::Result<()> {
    let (up, down) = create_migration_files(&args.dir, &args.message, Utc::now())?;
    println!("✓ Created {}", up.display());
    println!("✓ Created {}", down.display());
    Ok(())
}
