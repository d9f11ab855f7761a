/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Server info and health check
/// - `auth`: Login, token refresh and revocation
/// - `users`: Account registration and management
/// - `roles`: Role and permission management (admin)
/// - `todos`: Sample feature module
///
/// Each feature module exports `PREFIX` and `router()` and is listed in
/// [`crate::app::feature_modules`].

pub mod auth;
pub mod health;
pub mod roles;
pub mod todos;
pub mod users;
