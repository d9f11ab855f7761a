//! Subcommands of the `groundwork` binary
//!
//! Each submodule exposes its clap `Args` and an async `execute`.

pub mod database;
pub mod migrate;
pub mod new_module;
pub mod seed;

use groundwork_shared::db::pool::{create_pool, DatabaseConfig};
use groundwork_shared::settings::env_lookup;
use sqlx::PgPool;

/// Database settings from the environment (`DATABASE_URL` or `DB_*`)
pub fn database_config() -> anyhow::Result<DatabaseConfig> {
    Ok(DatabaseConfig::from_lookup(&env_lookup)?)
}

/// Connects using [`database_config`]
pub async fn connect() -> anyhow::Result<PgPool> {
    Ok(create_pool(database_config()?).await?)
}
