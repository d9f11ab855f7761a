//! # Groundwork Shared Library
//!
//! Domain core shared by the API server and the management CLI.
//!
//! ## Module Organization
//!
//! - `settings`: environment lookup helpers and durations
//! - `logging`: tracing subscriber setup
//! - `db`: pool, migrations, pagination and seeds
//! - `models`: database models
//! - `auth`: passwords, tokens, sessions and the request guard
//! - `redis`: Redis client backing the token store
//! - `locale`: request language and translated messages

pub mod auth;
pub mod db;
pub mod locale;
pub mod logging;
pub mod models;
pub mod redis;
pub mod settings;

/// Current version of the Groundwork shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
