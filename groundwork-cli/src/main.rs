//! # Groundwork CLI
//!
//! Management commands for a Groundwork deployment.
//!
//! ## Usage
//!
//! ```bash
//! groundwork migrate
//! groundwork seed --seeds roles
//! groundwork new-module invoices
//! ```

use clap::{Parser, Subcommand};
use groundwork_cli::commands::{database, migrate, new_module, seed};
use groundwork_shared::logging::{init_logging, LogConfig};
use groundwork_shared::settings::env_lookup;

#[derive(Debug, Parser)]
#[command(name = "groundwork", version)]
#[command(about = "Groundwork - microservice backend management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending migrations
    Migrate,
    /// Revert the latest migrations
    UndoMigrate(migrate::UndoArgs),
    /// Show applied and pending migrations
    MigrationStatus,
    /// Create an empty reversible migration pair
    CreateMigration(migrate::CreateArgs),
    /// Insert permissions, roles, the admin user and sample todos
    Seed(seed::SeedArgs),
    /// Create the configured database if it does not exist
    CreateDb,
    /// Drop the configured database
    DropDb(database::DropArgs),
    /// Scaffold a new feature module
    NewModule(new_module::NewModuleArgs),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match LogConfig::from_lookup(&env_lookup) {
        Ok(config) => init_logging(&config),
        Err(e) => eprintln!("Warning: {}", e),
    }

    let result = match cli.command {
        Commands::Migrate => migrate::execute_migrate().await,
        Commands::UndoMigrate(args) => migrate::execute_undo(args).await,
        Commands::MigrationStatus => migrate::execute_status().await,
        Commands::CreateMigration(args) => migrate::execute_create(args),
        Commands::Seed(args) => seed::execute(args).await,
        Commands::CreateDb => database::execute_create().await,
        Commands::DropDb(args) => database::execute_drop(args).await,
        Commands::NewModule(args) => new_module::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
