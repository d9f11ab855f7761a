//! Database lifecycle commands
//!
//! Usage:
//!   groundwork create-db
//!   groundwork drop-db --force

use super::database_config;
use clap::Args;
use groundwork_shared::db::migrations::{drop_database, ensure_database_exists};

#[derive(Debug, Args)]
pub struct DropArgs {
    /// Confirm dropping the database and all of its data
    #[arg(long)]
    pub force: bool,
}

pub async fn execute_create() -> anyhow::Result<()> {
    let config = database_config()?;
    ensure_database_exists(&config.url).await?;
    println!(
        "✓ Database {} is ready",
        config.database_name().unwrap_or("(unnamed)")
    );
    Ok(())
}

pub async fn execute_drop(args: DropArgs) -> anyhow::Result<()> {
    let config = database_config()?;
    let name = config.database_name().unwrap_or("(unnamed)");

    if !args.force {
        anyhow::bail!("refusing to drop database {} without --force", name);
    }

    drop_database(&config.url).await?;
    println!("✓ Dropped database {}", name);
    Ok(())
}
