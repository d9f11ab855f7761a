//! HTTP Basic credentials used by the login endpoint.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Errors decoding a Basic `Authorization` header
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BasicAuthError {
    #[error("Authorization header must be a Basic token")]
    NotBasic,

    #[error("Invalid token structure")]
    Malformed,

    #[error("Invalid credentials")]
    InvalidEncoding,
}

/// Username (or email) and password pair
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Renders the credentials as an `Authorization` header value
    pub fn to_header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

/// Parses `Basic base64(username:password)`
///
/// The scheme is case-insensitive. Only the first `:` separates the
/// username, so passwords may contain colons.
pub fn parse_basic_credentials(header: &str) -> Result<BasicCredentials, BasicAuthError> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next().ok_or(BasicAuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(BasicAuthError::NotBasic);
    }

    let encoded = parts.next().ok_or(BasicAuthError::Malformed)?;
    if parts.next().is_some() {
        return Err(BasicAuthError::Malformed);
    }

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| BasicAuthError::InvalidEncoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| BasicAuthError::InvalidEncoding)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(BasicAuthError::InvalidEncoding)?;
    if username.is_empty() {
        return Err(BasicAuthError::InvalidEncoding);
    }

    Ok(BasicCredentials::new(username, password))
}
