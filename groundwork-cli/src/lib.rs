//! # Groundwork CLI Library
//!
//! Management commands behind the `groundwork` binary: migrations, seeds,
//! database lifecycle and feature module scaffolding.
//!
//! ## Modules
//!
//! - `commands`: clap arguments and `execute` functions per subcommand
//! - `scaffold`: module name validation and template rendering

pub mod commands;
pub mod scaffold;
