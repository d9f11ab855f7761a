/// Configuration management for the API server
///
/// Configuration comes from environment variables (optionally loaded from a
/// `.env` file). Every section is read through a [`Lookup`] so tests can feed
/// a map instead of touching the process environment.
///
/// # Environment Variables
///
/// - `APP_NAME`, `APP_VERSION`, `APP_URL`, `APP_TIMEZONE`, `PAGE_SIZE`
/// - `API_HOST` (default: 0.0.0.0), `API_PORT` (default: 8000)
/// - `DATABASE_URL` or `DB_USER`/`DB_PASS`/`DB_HOST`/`DB_PORT`/`DB_NAME`
/// - `SECRET_KEY`: JWT signing secret (required, at least 32 characters)
/// - `ALGORITHM`, `JWT_ISSUER`, `ACCESS_UNIT`/`ACCESS_VALUE`, `REFRESH_UNIT`/`REFRESH_VALUE`
/// - `EXCLUDED_PATHS`: comma-separated regexes that skip authentication
/// - `AUTH_SERVICE_URL`, `AUTH_VERIFY_ENDPOINT`: delegated token validation
/// - `ALLOWED_ORIGINS`, `ALLOWED_METHODS`, `ALLOWED_HEADERS`, `ALLOW_CREDENTIALS`
/// - `LOG_LEVEL`, `LOG_FORMAT`, `LOG_NAME`, `LOG_THRESHOLD_UNIT`, `LOG_THRESHOLD_VALUE`
/// - `REDIS_URL` or `REDIS_HOST`/`REDIS_PORT`/`REDIS_DB`
///
/// # Example
///
/// ```no_run
/// use groundwork_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use groundwork_shared::auth::excluded::ExcludedPaths;
use groundwork_shared::auth::jwt::{JwtSettings, SigningAlgorithm};
use groundwork_shared::auth::remote::DEFAULT_VERIFY_ENDPOINT;
use groundwork_shared::db::pool::DatabaseConfig;
use groundwork_shared::logging::LogConfig;
use groundwork_shared::redis::RedisConfig;
use groundwork_shared::settings::{
    env_lookup, get, get_or, parse_bool_or, parse_or, require, split_csv, ConfigError, Lookup,
    Threshold, TimeUnit,
};

/// Minimum length of `SECRET_KEY`
pub const MIN_SECRET_LENGTH: usize = 32;

/// Paths reachable without a token unless `EXCLUDED_PATHS` says otherwise
pub const DEFAULT_EXCLUDED_PATHS: &str = "^/$,^/health$,^/v1/auth/?$,^/v1/users/create/?$";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,

    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtSettings,

    pub cors: CorsConfig,

    pub log: LogConfig,

    /// Token store backend; in-process memory when unset
    pub redis: Option<RedisConfig>,

    /// Regexes for paths that skip the JWT guard
    pub excluded_paths: Vec<String>,

    pub auth_service: Option<AuthServiceConfig>,
}

/// Application metadata
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub url: Option<String>,
    pub timezone: String,
    /// Default page size for paginated listings
    pub page_size: i64,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// CORS policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
            allow_credentials: true,
        }
    }
}

/// External token validation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthServiceConfig {
    pub url: String,
    pub verify_endpoint: String,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable if a required variable is
    /// missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let app = AppConfig {
            name: get_or(lookup, "APP_NAME", "Groundwork"),
            version: get_or(lookup, "APP_VERSION", "0.0.1"),
            url: get(lookup, "APP_URL"),
            timezone: get_or(lookup, "APP_TIMEZONE", "UTC"),
            page_size: parse_or(lookup, "PAGE_SIZE", 10)?,
        };
        if app.page_size < 1 {
            return Err(ConfigError::invalid(
                "PAGE_SIZE",
                &app.page_size.to_string(),
                "must be at least 1",
            ));
        }

        let api = ApiConfig {
            host: get_or(lookup, "API_HOST", "0.0.0.0"),
            port: parse_or(lookup, "API_PORT", 8000)?,
        };

        let secret = require(lookup, "SECRET_KEY")?;
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::invalid(
                "SECRET_KEY",
                "[REDACTED]",
                format!("must be at least {} characters long", MIN_SECRET_LENGTH),
            ));
        }
        let jwt = JwtSettings {
            algorithm: parse_or(lookup, "ALGORITHM", SigningAlgorithm::default())?,
            issuer: get_or(lookup, "JWT_ISSUER", "groundwork"),
            access_ttl: Threshold::from_lookup(lookup, "ACCESS", Threshold::new(TimeUnit::Hours, 1))?,
            refresh_ttl: Threshold::from_lookup(
                lookup,
                "REFRESH",
                Threshold::new(TimeUnit::Days, 7),
            )?,
            secret,
        };

        let cors = CorsConfig {
            allowed_origins: csv_or_any(lookup, "ALLOWED_ORIGINS"),
            allowed_methods: csv_or_any(lookup, "ALLOWED_METHODS"),
            allowed_headers: csv_or_any(lookup, "ALLOWED_HEADERS"),
            allow_credentials: parse_bool_or(lookup, "ALLOW_CREDENTIALS", true)?,
        };

        let auth_service = get(lookup, "AUTH_SERVICE_URL").map(|url| AuthServiceConfig {
            url,
            verify_endpoint: get_or(lookup, "AUTH_VERIFY_ENDPOINT", DEFAULT_VERIFY_ENDPOINT),
        });

        Ok(Self {
            app,
            api,
            database: DatabaseConfig::from_lookup(lookup)?,
            jwt,
            cors,
            log: LogConfig::from_lookup(lookup)?,
            redis: RedisConfig::from_lookup(lookup)?,
            excluded_paths: split_csv(&get_or(lookup, "EXCLUDED_PATHS", DEFAULT_EXCLUDED_PATHS)),
            auth_service,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn excluded_paths(&self) -> ExcludedPaths {
        ExcludedPaths::new(&self.excluded_paths)
    }
}

fn csv_or_any(lookup: &impl Lookup, key: &str) -> Vec<String> {
    let values = split_csv(&get_or(lookup, key, "*"));
    if values.is_empty() {
        vec!["*".to_string()]
    } else {
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Lookup {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SECRET_KEY", SECRET),
            ("DATABASE_URL", "postgres://localhost/groundwork"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(&lookup_from(&minimal())).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.app.name, "Groundwork");
        assert_eq!(config.app.page_size, 10);
        assert_eq!(config.jwt.issuer, "groundwork");
        assert_eq!(config.jwt.access_ttl, Threshold::new(TimeUnit::Hours, 1));
        assert_eq!(config.jwt.refresh_ttl, Threshold::new(TimeUnit::Days, 7));
        assert_eq!(config.cors, CorsConfig::default());
        assert!(config.redis.is_none());
        assert!(config.auth_service.is_none());

        let excluded = config.excluded_paths();
        assert!(excluded.is_excluded("/health"));
        assert!(excluded.is_excluded("/v1/users/create"));
        assert!(!excluded.is_excluded("/v1/users/me"));
    }

    #[test]
    fn test_secret_key_required() {
        let lookup = lookup_from(&[("DATABASE_URL", "postgres://localhost/db")]);
        let err = Config::from_lookup(&lookup).unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let lookup = lookup_from(&[
            ("SECRET_KEY", "short"),
            ("DATABASE_URL", "postgres://localhost/db"),
        ]);
        let err = Config::from_lookup(&lookup).unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
        assert!(!err.to_string().contains("short"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = minimal();
        pairs.extend([
            ("API_PORT", "9000"),
            ("ALGORITHM", "hs512"),
            ("ACCESS_UNIT", "minutes"),
            ("ACCESS_VALUE", "15"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("ALLOW_CREDENTIALS", "false"),
            ("EXCLUDED_PATHS", "^/public"),
            ("AUTH_SERVICE_URL", "http://auth:8000"),
            ("REDIS_URL", "redis://cache:6379"),
        ]);
        let config = Config::from_lookup(&lookup_from(&pairs)).unwrap();

        assert_eq!(config.api.port, 9000);
        assert_eq!(config.jwt.access_ttl, Threshold::new(TimeUnit::Minutes, 15));
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.cors.allow_credentials);
        assert_eq!(config.excluded_paths, vec!["^/public"]);
        assert_eq!(
            config.auth_service,
            Some(AuthServiceConfig {
                url: "http://auth:8000".to_string(),
                verify_endpoint: DEFAULT_VERIFY_ENDPOINT.to_string(),
            })
        );
        assert!(config.redis.is_some());
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = minimal();
        pairs.push(("API_PORT", "eighty"));
        let err = Config::from_lookup(&lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }
}
