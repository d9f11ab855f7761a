/// JWT token generation and validation
///
/// Tokens come in access/refresh pairs. Both carry the user id as `sub`, the
/// user's email, the token type and a random `jti` so two tokens minted in the
/// same second never collide in the token store.
///
/// # Token lifetimes
///
/// Lifetimes are configured with `ACCESS_UNIT`/`ACCESS_VALUE` and
/// `REFRESH_UNIT`/`REFRESH_VALUE` (1 hour and 7 days by default).
///
/// # Example
///
/// ```
/// use groundwork_shared::auth::jwt::{create_token_pair, validate_token, JwtSettings, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = JwtSettings::new("a-very-long-secret-key-of-at-least-32-chars");
/// let pair = create_token_pair(&settings, 42, "user@example.com")?;
///
/// let claims = validate_token(&pair.access_token, &settings, TokenType::Access)?;
/// assert_eq!(claims.sub, "42");
/// # Ok(())
/// # }
/// ```

use crate::settings::{Threshold, TimeUnit};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    Encoding(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Expected {expected} token, got {actual}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },
}

/// Token type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token sent as `Authorization: Bearer`
    Access,
    /// Long-lived token sent in the `refreshtoken` header
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HMAC algorithms accepted in `ALGORITHM`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningAlgorithm(Algorithm);

impl SigningAlgorithm {
    pub fn algorithm(&self) -> Algorithm {
        self.0
    }
}

impl Default for SigningAlgorithm {
    fn default() -> Self {
        SigningAlgorithm(Algorithm::HS256)
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm(Algorithm::HS256)),
            "HS384" => Ok(SigningAlgorithm(Algorithm::HS384)),
            "HS512" => Ok(SigningAlgorithm(Algorithm::HS512)),
            other => Err(format!(
                "unsupported algorithm '{}', expected HS256, HS384 or HS512",
                other
            )),
        }
    }
}

/// Signing and lifetime settings
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub algorithm: SigningAlgorithm,
    pub issuer: String,
    pub access_ttl: Threshold,
    pub refresh_ttl: Threshold,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtSettings {
    /// Settings with default lifetimes, HS256 and the `groundwork` issuer
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: SigningAlgorithm::default(),
            issuer: "groundwork".to_string(),
            access_ttl: Threshold::new(TimeUnit::Hours, 1),
            refresh_ttl: Threshold::new(TimeUnit::Days, 7),
        }
    }

    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl.as_duration(),
            TokenType::Refresh => self.refresh_ttl.as_duration(),
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,

    pub email: String,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,

    pub nbf: i64,

    /// Unique token id
    pub jti: String,
}

impl Claims {
    pub fn new(
        user_id: i64,
        email: &str,
        token_type: TokenType,
        issuer: &str,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            token_type,
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Numeric user id, when `sub` carries one
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    /// Seconds left before expiry, zero once expired
    pub fn remaining_seconds(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}

/// An access/refresh token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs a set of claims
///
/// # Errors
///
/// Returns `JwtError::Encoding` if signing fails
pub fn create_token(claims: &Claims, settings: &JwtSettings) -> Result<String, JwtError> {
    let header = Header::new(settings.algorithm.algorithm());
    let key = EncodingKey::from_secret(settings.secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Encoding(e.to_string()))
}

/// Mints a token of `token_type` for a user using the configured lifetime
pub fn issue_token(
    settings: &JwtSettings,
    user_id: i64,
    email: &str,
    token_type: TokenType,
) -> Result<(String, Claims), JwtError> {
    let claims = Claims::new(
        user_id,
        email,
        token_type,
        &settings.issuer,
        settings.ttl(token_type),
    );
    let token = create_token(&claims, settings)?;
    Ok((token, claims))
}

/// Mints an access and a refresh token for a user
pub fn create_token_pair(
    settings: &JwtSettings,
    user_id: i64,
    email: &str,
) -> Result<TokenPair, JwtError> {
    let (access_token, _) = issue_token(settings, user_id, email, TokenType::Access)?;
    let (refresh_token, _) = issue_token(settings, user_id, email, TokenType::Refresh)?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Decodes and checks a token's signature, issuer, expiry and type
///
/// # Errors
///
/// - `JwtError::Expired` once `exp` has passed
/// - `JwtError::WrongTokenType` for a valid token of the other type
/// - `JwtError::Invalid` for anything else
pub fn validate_token(
    token: &str,
    settings: &JwtSettings,
    expected: TokenType,
) -> Result<Claims, JwtError> {
    let claims = decode_claims(token, settings)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType {
            expected,
            actual: claims.token_type,
        });
    }

    Ok(claims)
}

/// Decodes a token without checking its type
pub fn decode_claims(token: &str, settings: &JwtSettings) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(settings.secret.as_bytes());

    let mut validation = Validation::new(settings.algorithm.algorithm());
    validation.set_issuer(&[settings.issuer.as_str()]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_that_is_long_enough_for_hs256";

    fn settings() -> JwtSettings {
        JwtSettings::new(SECRET)
    }

    #[test]
    fn test_create_and_validate_access_token() {
        let settings = settings();
        let (token, claims) = issue_token(&settings, 7, "a@b.com", TokenType::Access).unwrap();

        assert_eq!(token.split('.').count(), 3);

        let decoded = validate_token(&token, &settings, TokenType::Access).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.user_id(), Some(7));
        assert_eq!(decoded.email, "a@b.com");
        assert_eq!(decoded.iss, "groundwork");
    }

    #[test]
    fn test_lifetimes_follow_settings() {
        let mut settings = settings();
        settings.access_ttl = Threshold::new(TimeUnit::Minutes, 15);

        let (_, access) = issue_token(&settings, 1, "a@b.com", TokenType::Access).unwrap();
        let (_, refresh) = issue_token(&settings, 1, "a@b.com", TokenType::Refresh).unwrap();

        assert_eq!(access.exp - access.iat, 15 * 60);
        assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_pair_tokens_are_distinct() {
        let settings = settings();
        let pair = create_token_pair(&settings, 1, "a@b.com").unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);

        let again = create_token_pair(&settings, 1, "a@b.com").unwrap();
        assert_ne!(pair.access_token, again.access_token);
    }

    #[test]
    fn test_wrong_token_type() {
        let settings = settings();
        let pair = create_token_pair(&settings, 1, "a@b.com").unwrap();

        let err = validate_token(&pair.refresh_token, &settings, TokenType::Access).unwrap_err();
        assert_eq!(
            err,
            JwtError::WrongTokenType {
                expected: TokenType::Access,
                actual: TokenType::Refresh,
            }
        );
    }

    #[test]
    fn test_expired_token() {
        let settings = settings();
        let claims = Claims::new(1, "a@b.com", TokenType::Access, "groundwork", Duration::seconds(-10));
        let token = create_token(&claims, &settings).unwrap();

        assert_eq!(
            validate_token(&token, &settings, TokenType::Access),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_and_garbage() {
        let settings = settings();
        let pair = create_token_pair(&settings, 1, "a@b.com").unwrap();

        let other = JwtSettings::new("a_completely_different_secret_value_here");
        assert!(matches!(
            validate_token(&pair.access_token, &other, TokenType::Access),
            Err(JwtError::Invalid(_))
        ));
        assert!(matches!(
            validate_token("not.a.jwt", &settings, TokenType::Access),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_wrong_issuer() {
        let settings = settings();
        let claims = Claims::new(1, "a@b.com", TokenType::Access, "someone-else", Duration::hours(1));
        let token = create_token(&claims, &settings).unwrap();

        assert!(matches!(
            validate_token(&token, &settings, TokenType::Access),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_algorithm_must_match() {
        let mut hs512 = settings();
        hs512.algorithm = "hs512".parse().unwrap();
        let (token, _) = issue_token(&hs512, 1, "a@b.com", TokenType::Access).unwrap();

        assert!(validate_token(&token, &hs512, TokenType::Access).is_ok());
        assert!(validate_token(&token, &settings(), TokenType::Access).is_err());
    }

    #[test]
    fn test_algorithm_parsing() {
        assert!("HS384".parse::<SigningAlgorithm>().is_ok());
        assert!("RS256".parse::<SigningAlgorithm>().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("REDACTED"));
    }
}
