//! Seed command
//!
//! Usage: groundwork seed [--seeds all|permissions|roles|users|todos]
//!
//! The `users` seed creates an admin from `ADMIN_EMAIL` and `ADMIN_PASSWORD`
//! and is skipped when either is unset.

use super::connect;
use clap::Args;
use groundwork_shared::db::seeds::{run_seeds, AdminAccount, Seed};
use groundwork_shared::settings::{env_lookup, get, Lookup};

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Which seed to run
    #[arg(long, default_value = "all", value_parser = parse_seed)]
    pub seeds: Seed,
}

fn parse_seed(raw: &str) -> Result<Seed, String> {
    raw.parse().map_err(|e: groundwork_shared::db::seeds::SeedError| e.to_string())
}

/// Admin credentials, when both variables are set
pub fn admin_account(lookup: &impl Lookup) -> Option<AdminAccount> {
    Some(AdminAccount {
        email: get(lookup, "ADMIN_EMAIL")?,
        password: get(lookup, "ADMIN_PASSWORD")?,
    })
}

pub async fn execute(args: SeedArgs) -> anyhow::Result<()> {
    let pool = connect().await?;
    let admin = admin_account(&env_lookup);

    run_seeds(&pool, args.seeds, admin.as_ref()).await?;
    println!("✓ Seeded {}", args.seeds);
    Ok(())
}
