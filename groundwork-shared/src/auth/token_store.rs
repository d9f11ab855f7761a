/// Issued-token registry
///
/// Every token handed out by the login endpoint is recorded here until it
/// expires or is revoked. A token that validates cryptographically but is
/// missing from the store is treated as revoked.
///
/// Keys have the form `{sub}:{sha256(token)}`; the raw token is never used as
/// a key. Each record points at the key of its pair so an access token and
/// its refresh token can be revoked together.

use crate::auth::jwt::TokenType;
use crate::redis::{RedisClient, RedisClientError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Token store errors
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token store unavailable: {0}")]
    Backend(#[from] RedisClientError),

    #[error("corrupt token record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Metadata kept for an issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub user_id: i64,
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Store key of the linked token, empty until linked
    pub pair: String,
}

/// Builds the store key for a token
pub fn token_key(sub: &str, token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}:{}", sub, hex::encode(digest))
}

/// Storage backend for issued tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Inserts or replaces a record that expires after `ttl`
    async fn put(&self, key: &str, record: &TokenRecord, ttl: Duration) -> Result<(), TokenStoreError>;

    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, TokenStoreError>;

    /// Removes the given keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<usize, TokenStoreError>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    async fn is_healthy(&self) -> bool {
        true
    }
}

/// In-process store for single-instance deployments and tests
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, (TokenRecord, Instant)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops expired entries
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .write()
            .await
            .retain(|_, (_, expires_at)| *expires_at > now);
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, key: &str, record: &TokenRecord, ttl: Duration) -> Result<(), TokenStoreError> {
        let expires_at = Instant::now() + ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, exp)| *exp > Instant::now());
        entries.insert(key.to_string(), (record.clone(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, TokenStoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(record, _)| record.clone()))
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, TokenStoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|(_, expires_at)| *expires_at > now)
            .count();
        Ok(removed)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed store shared by every API instance
#[derive(Clone)]
pub struct RedisTokenStore {
    client: RedisClient,
    prefix: String,
}

impl RedisTokenStore {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            prefix: "token:".to_string(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn put(&self, key: &str, record: &TokenRecord, ttl: Duration) -> Result<(), TokenStoreError> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.client.get_connection();
        let seconds = ttl.as_secs().max(1);

        self.client
            .timed(
                redis::cmd("SET")
                    .arg(self.namespaced(key))
                    .arg(payload)
                    .arg("EX")
                    .arg(seconds)
                    .query_async::<_, ()>(&mut conn),
            )
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, TokenStoreError> {
        let mut conn = self.client.get_connection();
        let payload: Option<String> = self
            .client
            .timed(
                redis::cmd("GET")
                    .arg(self.namespaced(key))
                    .query_async(&mut conn),
            )
            .await?;

        payload
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(TokenStoreError::from)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, TokenStoreError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let namespaced: Vec<String> = keys.iter().map(|k| self.namespaced(k)).collect();
        let mut conn = self.client.get_connection();
        let removed: usize = self
            .client
            .timed(redis::cmd("DEL").arg(namespaced).query_async(&mut conn))
            .await?;
        Ok(removed)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn is_healthy(&self) -> bool {
        self.client.ping().await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pair: &str) -> TokenRecord {
        TokenRecord {
            user_id: 1,
            email: "a@b.com".to_string(),
            token_type: TokenType::Access,
            pair: pair.to_string(),
        }
    }

    #[test]
    fn test_token_key_hashes_token() {
        let key = token_key("1", "header.payload.signature");
        let (sub, digest) = key.split_once(':').unwrap();
        assert_eq!(sub, "1");
        assert_eq!(digest.len(), 64);
        assert!(!key.contains("payload"));
        assert_eq!(key, token_key("1", "header.payload.signature"));
    }

    #[test]
    fn test_record_serializes_type_field() {
        let json = serde_json::to_value(record("x")).unwrap();
        assert_eq!(json["type"], "access");
        assert_eq!(json["pair"], "x");
    }

    #[tokio::test]
    async fn test_memory_put_get_delete() {
        let store = MemoryTokenStore::new();
        store
            .put("k1", &record("k2"), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k1").await.unwrap(), Some(record("k2")));
        assert_eq!(store.get("missing").await.unwrap(), None);

        let removed = store
            .delete(&["k1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("k1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_entries_expire() {
        let store = MemoryTokenStore::new();
        store
            .put("k1", &record(""), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(store.get("k1").await.unwrap().is_none());
        assert!(store.is_empty().await);
        assert_eq!(store.delete(&["k1".to_string()]).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryTokenStore::new();
        store.put("short", &record(""), Duration::from_secs(1)).await.unwrap();
        store.put("long", &record(""), Duration::from_secs(100)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        store.purge_expired().await;

        assert_eq!(store.entries.read().await.len(), 1);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_redis_store_roundtrip() {
        let client = RedisClient::new(crate::redis::RedisConfig::new("redis://localhost:6379"))
            .await
            .unwrap();
        let store = RedisTokenStore::new(client);
        let key = format!("test:{}", uuid::Uuid::new_v4());

        store.put(&key, &record(""), Duration::from_secs(30)).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(record("")));
        assert_eq!(store.delete(&[key.clone()]).await.unwrap(), 1);
        assert!(store.get(&key).await.unwrap().is_none());
    }
}
