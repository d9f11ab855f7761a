/// Token sessions: issuing, refreshing and revoking token pairs
///
/// A session is an access/refresh pair recorded in a [`TokenStore`]. Each
/// record links to the other half of its pair:
///
/// ```text
/// login    ──> access(A) <──pair──> refresh(R)
/// refresh  ──> A revoked, access(A') <──pair──> refresh(R)
/// logout   ──> A' and R revoked
/// ```

use crate::auth::jwt::{issue_token, validate_token, Claims, JwtError, JwtSettings, TokenPair, TokenType};
use crate::auth::token_store::{token_key, TokenRecord, TokenStore, TokenStoreError};
use tracing::{debug, info, warn};

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] TokenStoreError),

    /// Token is well formed but unknown to the store (revoked or never issued)
    #[error("token not found")]
    NotFound,

    #[error("token not revoked")]
    NotRevoked,
}

/// The user a session is issued for
#[derive(Debug, Clone, Copy)]
pub struct SessionUser<'a> {
    pub id: i64,
    pub email: &'a str,
}

/// Issues, refreshes and revokes token pairs
pub struct SessionManager<'a> {
    settings: &'a JwtSettings,
    store: &'a dyn TokenStore,
}

impl<'a> SessionManager<'a> {
    pub fn new(settings: &'a JwtSettings, store: &'a dyn TokenStore) -> Self {
        Self { settings, store }
    }

    /// Mints and records a linked access/refresh pair
    pub async fn issue(&self, user: SessionUser<'_>) -> Result<TokenPair, SessionError> {
        let (access_token, access) =
            issue_token(self.settings, user.id, user.email, TokenType::Access)?;
        let (refresh_token, refresh) =
            issue_token(self.settings, user.id, user.email, TokenType::Refresh)?;

        let access_key = token_key(&access.sub, &access_token);
        let refresh_key = token_key(&refresh.sub, &refresh_token);

        self.record(&access_key, &access, &refresh_key).await?;
        self.record(&refresh_key, &refresh, &access_key).await?;

        info!(user_id = user.id, "Issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Trades a refresh token for a new access token
    ///
    /// The previous access token of the pair is revoked. The refresh token
    /// itself stays valid and is linked to the new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = validate_token(refresh_token, self.settings, TokenType::Refresh)?;
        let refresh_key = token_key(&claims.sub, refresh_token);

        let mut refresh_record = self.store.get(&refresh_key).await?.ok_or_else(|| {
            warn!(sub = %claims.sub, "Refresh token not found in store");
            SessionError::NotFound
        })?;

        let user_id = claims.user_id().unwrap_or(refresh_record.user_id);
        let (access_token, access) = issue_token(
            self.settings,
            user_id,
            &refresh_record.email,
            TokenType::Access,
        )?;
        let access_key = token_key(&access.sub, &access_token);

        if !refresh_record.pair.is_empty() {
            self.store.delete(&[refresh_record.pair.clone()]).await?;
            debug!("Revoked previous access token");
        }

        self.record(&access_key, &access, &refresh_key).await?;

        refresh_record.pair = access_key;
        let remaining = std::time::Duration::from_secs(claims.remaining_seconds().max(1));
        self.store.put(&refresh_key, &refresh_record, remaining).await?;

        info!(user_id, "Refreshed access token");
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Revokes an access token and its paired refresh token
    ///
    /// A validly signed token that the store does not hold is `NotRevoked`.
    pub async fn revoke(&self, access_token: &str) -> Result<(), SessionError> {
        let (key, record) = match self.lookup(access_token, TokenType::Access).await {
            Err(SessionError::NotFound) => return Err(SessionError::NotRevoked),
            other => other?,
        };

        let mut keys = vec![key];
        if !record.pair.is_empty() {
            keys.push(record.pair);
        }

        if self.store.delete(&keys).await? == 0 {
            return Err(SessionError::NotRevoked);
        }

        info!(user_id = record.user_id, "Revoked token pair");
        Ok(())
    }

    /// Validates a token and returns its store record
    pub async fn authenticate(&self, access_token: &str) -> Result<TokenRecord, SessionError> {
        self.lookup(access_token, TokenType::Access)
            .await
            .map(|(_, record)| record)
    }

    async fn lookup(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<(String, TokenRecord), SessionError> {
        let claims = validate_token(token, self.settings, expected)?;
        let key = token_key(&claims.sub, token);

        match self.store.get(&key).await? {
            Some(record) if record.token_type == expected => Ok((key, record)),
            _ => Err(SessionError::NotFound),
        }
    }

    async fn record(&self, key: &str, claims: &Claims, pair: &str) -> Result<(), SessionError> {
        let record = TokenRecord {
            user_id: claims.user_id().unwrap_or_default(),
            email: claims.email.clone(),
            token_type: claims.token_type,
            pair: pair.to_string(),
        };
        let ttl = self.settings.ttl(claims.token_type).to_std().unwrap_or_default();

        self.store.put(key, &record, ttl).await?;
        Ok(())
    }
}
