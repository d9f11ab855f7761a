/// Redis connectivity
///
/// Redis backs the token store when `REDIS_URL` is set. Without it, tokens
/// are kept in process memory (see [`crate::auth::token_store`]).

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
