//! Feature module scaffolding command
//!
//! Usage: groundwork new-module <NAME> [--root .]

use crate::scaffold::{next_steps, plan, write, ModuleName};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct NewModuleArgs {
    /// Module name: lowercase letters, digits and '_', starting with a letter
    pub name: String,

    /// Workspace root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

pub fn execute(args: NewModuleArgs) -> anyhow::Result<()> {
    let name = ModuleName::parse(&args.name)?;

    let files = plan(&args.root, &name, Utc::now());
    for path in write(&files)? {
        println!("✓ Created {}", path.display());
    }

    println!();
    println!("Next steps:");
    for (i, step) in next_steps(&name).iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    Ok(())
}
