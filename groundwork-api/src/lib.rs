//! # Groundwork API Server Library
//!
//! This library provides the HTTP service of the Groundwork backend.
//!
//! ## Modules
//!
//! - `app`: Application state, feature module registry and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extractors`: Role-aware user extractors
//! - `middleware`: JWT guard, request logging and localization
//! - `routes`: API route handlers
//! - `admin`: Admin console over registered model views

pub mod admin;
pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
