/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: access/refresh token minting and validation
/// - [`basic`]: HTTP Basic credentials for the login endpoint
/// - [`excluded`]: regex list of paths that skip authentication
/// - [`token_store`]: registry of issued tokens (memory or Redis)
/// - [`session`]: issuing, refreshing and revoking token pairs
/// - [`remote`]: delegated validation against an external auth service
/// - [`middleware`]: the path-aware bearer token guard
/// - [`authorization`]: user resolution and role checks
///
/// # Example
///
/// ```
/// use groundwork_shared::auth::excluded::ExcludedPaths;
/// use groundwork_shared::auth::jwt::JwtSettings;
/// use groundwork_shared::auth::middleware::{AuthError, AuthGuard, TokenValidation};
///
/// # async fn example() {
/// let guard = AuthGuard::new(
///     ExcludedPaths::from_csv("^/$,^/health$"),
///     TokenValidation::Local(JwtSettings::new("a-very-long-secret-key-of-at-least-32-chars")),
/// );
///
/// assert_eq!(guard.authorize("/health", None).await, Ok(None));
/// assert_eq!(guard.authorize("/v1/todos", None).await, Err(AuthError::MissingHeader));
/// # }
/// ```

pub mod authorization;
pub mod basic;
pub mod excluded;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod remote;
pub mod session;
pub mod token_store;
