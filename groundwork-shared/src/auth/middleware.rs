/// Request authentication guard
///
/// Framework-independent core of the JWT middleware. The HTTP layer hands it
/// the request path and the raw `Authorization` header and gets back either
/// an [`AuthContext`], `None` for excluded paths, or an [`AuthError`].
///
/// Decision order:
///
/// 1. Excluded path: pass through without looking at headers
/// 2. No `Authorization` header: [`AuthError::MissingHeader`]
/// 3. Anything but `Bearer <token>`: [`AuthError::InvalidHeader`]
/// 4. Local mode: decode and check the token as an access token
/// 5. Remote mode: require the auth service to be up, then let it decide

use super::excluded::ExcludedPaths;
use super::jwt::{validate_token, JwtError, JwtSettings, TokenType};
use super::remote::{RemoteAuthError, RemoteVerifier};
use serde::Serialize;
use tracing::{debug, warn};

/// Authenticated caller attached to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    /// Token subject (user id) when decoded locally
    pub sub: Option<String>,

    pub email: Option<String>,

    /// The bearer token as presented
    #[serde(skip_serializing)]
    pub token: String,
}

/// Authentication failures
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingHeader,

    #[error("Invalid authorization header")]
    InvalidHeader,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Auth service unavailable")]
    ServiceUnavailable,

    #[error("{detail}")]
    Rejected { status: u16, detail: String },
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::ServiceUnavailable => 503,
            AuthError::Rejected { status, .. } => *status,
            _ => 401,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<RemoteAuthError> for AuthError {
    fn from(err: RemoteAuthError) -> Self {
        match err {
            RemoteAuthError::Rejected { status, detail } => AuthError::Rejected { status, detail },
            RemoteAuthError::Unavailable(_) | RemoteAuthError::InvalidUrl(_) => {
                AuthError::ServiceUnavailable
            }
        }
    }
}

/// How bearer tokens are validated
#[derive(Debug, Clone)]
pub enum TokenValidation {
    Local(JwtSettings),
    Remote(RemoteVerifier),
}

/// Path-aware bearer token guard
#[derive(Debug, Clone)]
pub struct AuthGuard {
    excluded: ExcludedPaths,
    validation: TokenValidation,
}

impl AuthGuard {
    pub fn new(excluded: ExcludedPaths, validation: TokenValidation) -> Self {
        Self {
            excluded,
            validation,
        }
    }

    pub fn excluded(&self) -> &ExcludedPaths {
        &self.excluded
    }

    /// Decides whether a request may proceed
    ///
    /// Returns `Ok(None)` for excluded paths and `Ok(Some(ctx))` for a
    /// request carrying a valid bearer token.
    pub async fn authorize(
        &self,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<Option<AuthContext>, AuthError> {
        if self.excluded.is_excluded(path) {
            debug!(path, "Path excluded from authentication");
            return Ok(None);
        }

        let header = authorization.ok_or_else(|| {
            debug!(path, "Authorization header missing");
            AuthError::MissingHeader
        })?;
        let token = bearer_token(header).ok_or(AuthError::InvalidHeader)?;

        match &self.validation {
            TokenValidation::Local(settings) => {
                let claims = validate_token(token, settings, TokenType::Access).map_err(|e| {
                    debug!(path, error = %e, "Token rejected");
                    AuthError::from(e)
                })?;
                Ok(Some(AuthContext {
                    sub: Some(claims.sub),
                    email: Some(claims.email),
                    token: token.to_string(),
                }))
            }
            TokenValidation::Remote(verifier) => {
                if !verifier.is_up().await {
                    warn!(url = verifier.base_url(), "Auth service is down");
                    return Err(AuthError::ServiceUnavailable);
                }
                verifier.verify(token).await?;
                Ok(Some(AuthContext {
                    sub: None,
                    email: None,
                    token: token.to_string(),
                }))
            }
        }
    }
}

/// Extracts the token from `Bearer <token>`
///
/// The header must split into exactly two whitespace-separated parts.
pub fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, issue_token, Claims};
    use chrono::Duration;

    const SECRET: &str = "guard_test_secret_key_that_is_long_enough";

    fn guard() -> AuthGuard {
        AuthGuard::new(
            ExcludedPaths::from_csv("^/$,^/health$,^/v1/auth/?$"),
            TokenValidation::Local(JwtSettings::new(SECRET)),
        )
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn test_excluded_path_needs_no_header() {
        assert_eq!(guard().authorize("/health", None).await, Ok(None));
        assert_eq!(guard().authorize("/", Some("garbage")).await, Ok(None));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_headers() {
        let guard = guard();
        assert_eq!(
            guard.authorize("/v1/todos", None).await,
            Err(AuthError::MissingHeader)
        );
        assert_eq!(
            guard.authorize("/v1/todos", Some("Token abc")).await,
            Err(AuthError::InvalidHeader)
        );
        assert_eq!(
            guard.authorize("/v1/todos", Some("Bearer not-a-jwt")).await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_valid_access_token() {
        let settings = JwtSettings::new(SECRET);
        let (token, _) = issue_token(&settings, 3, "c@d.com", TokenType::Access).unwrap();

        let ctx = guard()
            .authorize("/v1/todos", Some(&format!("Bearer {}", token)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctx.sub.as_deref(), Some("3"));
        assert_eq!(ctx.email.as_deref(), Some("c@d.com"));
        assert_eq!(ctx.token, token);
    }

    #[tokio::test]
    async fn test_expired_and_refresh_tokens_rejected() {
        let settings = JwtSettings::new(SECRET);
        let expired = Claims::new(3, "c@d.com", TokenType::Access, "groundwork", Duration::seconds(-5));
        let expired = create_token(&expired, &settings).unwrap();
        let (refresh, _) = issue_token(&settings, 3, "c@d.com", TokenType::Refresh).unwrap();

        let guard = guard();
        assert_eq!(
            guard
                .authorize("/v1/todos", Some(&format!("Bearer {}", expired)))
                .await,
            Err(AuthError::Expired)
        );
        assert_eq!(
            guard
                .authorize("/v1/todos", Some(&format!("Bearer {}", refresh)))
                .await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_remote_service_down_is_503() {
        let guard = AuthGuard::new(
            ExcludedPaths::default(),
            TokenValidation::Remote(
                RemoteVerifier::new("http://127.0.0.1:9", "v1/token/validate").unwrap(),
            ),
        );

        let err = guard
            .authorize("/v1/todos", Some("Bearer abc"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::ServiceUnavailable);
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MissingHeader.status_code(), 401);
        assert_eq!(
            AuthError::Rejected {
                status: 403,
                detail: "x".to_string()
            }
            .status_code(),
            403
        );
    }
}
