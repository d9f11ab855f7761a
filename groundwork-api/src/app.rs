/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use groundwork_api::{app::AppState, config::Config};
/// use groundwork_shared::auth::token_store::MemoryTokenStore;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(MemoryTokenStore::new()))?;
/// let app = groundwork_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::admin;
use crate::config::{Config, CorsConfig};
use crate::error::ApiError;
use crate::middleware::logging::LogThrottle;
use crate::routes;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use groundwork_shared::auth::middleware::{AuthGuard, TokenValidation};
use groundwork_shared::auth::remote::{RemoteAuthError, RemoteVerifier};
use groundwork_shared::auth::session::SessionManager;
use groundwork_shared::auth::token_store::TokenStore;
use groundwork_shared::logging::request_span;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Registry of issued tokens
    pub tokens: Arc<dyn TokenStore>,

    pub guard: Arc<AuthGuard>,

    pub log_throttle: Arc<LogThrottle>,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Fails if `AUTH_SERVICE_URL` is set but not an http(s) URL
    pub fn new(db: PgPool, config: Config, tokens: Arc<dyn TokenStore>) -> Result<Self, RemoteAuthError> {
        let validation = match &config.auth_service {
            Some(service) => TokenValidation::Remote(RemoteVerifier::new(
                &service.url,
                &service.verify_endpoint,
            )?),
            None => TokenValidation::Local(config.jwt.clone()),
        };
        let guard = AuthGuard::new(config.excluded_paths(), validation);
        let log_throttle = LogThrottle::new(config.log.threshold.as_std());

        Ok(Self {
            db,
            config: Arc::new(config),
            tokens,
            guard: Arc::new(guard),
            log_throttle: Arc::new(log_throttle),
        })
    }

    /// Session operations bound to this state's settings and token store
    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(&self.config.jwt, self.tokens.as_ref())
    }

    pub fn page_size(&self) -> i64 {
        self.config.app.page_size
    }
}

/// A feature module mounted under `/v1`
pub struct FeatureModule {
    pub name: &'static str,
    pub prefix: &'static str,
    pub router: fn() -> Router<AppState>,
}

/// Every feature module, in mount order
///
/// New modules are added here after `groundwork new-module` scaffolds them.
pub fn feature_modules() -> Vec<FeatureModule> {
    vec![
        FeatureModule {
            name: "auth",
            prefix: routes::auth::PREFIX,
            router: routes::auth::router,
        },
        FeatureModule {
            name: "users",
            prefix: routes::users::PREFIX,
            router: routes::users::router,
        },
        FeatureModule {
            name: "roles",
            prefix: routes::roles::PREFIX,
            router: routes::roles::router,
        },
        FeatureModule {
            name: "todos",
            prefix: routes::todos::PREFIX,
            router: routes::todos::router,
        },
        FeatureModule {
            name: "admin",
            prefix: admin::PREFIX,
            router: admin::router,
        },
    ]
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /                     # Server info (public)
/// ├── GET /health               # Health check (public)
/// └── /v1/                      # Feature modules
///     ├── /auth                 # POST login, PUT refresh, DELETE revoke
///     ├── /users                # Accounts
///     ├── /roles                # Roles and permissions (admin)
///     ├── /todos                # Sample feature module
///     └── /admin                # Admin console (admin)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Localization (Accept-Language scope)
/// 2. Tracing spans (tower-http TraceLayer)
/// 3. Request logging (status-level, keep-alive throttled)
/// 4. CORS (tower-http CorsLayer), answers preflight
/// 5. JWT guard (excluded paths pass through)
pub fn build_router(state: AppState) -> Router {
    let mut v1 = Router::new();
    for module in feature_modules() {
        tracing::debug!(module = module.name, prefix = module.prefix, "Mounting feature module");
        v1 = v1.nest(module.prefix, (module.router)());
    }

    let cors = cors_layer(&state.config.cors);
    let service = state.config.log.name.clone();

    Router::new()
        .route("/", get(routes::health::server_info))
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1)
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::require_auth,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::logging::log_requests,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request| {
                    request_span(&service, request.method().as_str(), &request.uri().to_string())
                })
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(axum::middleware::from_fn(
            crate::middleware::locale::detect_language,
        ))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Builds the CORS layer
///
/// Browsers reject a literal `*` together with credentials, so wildcards are
/// answered by mirroring the request when credentials are allowed.
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let is_any = |values: &[String]| values.iter().any(|v| v == "*");
    let mirror = cors.allow_credentials;

    let origin = if is_any(&cors.allowed_origins) {
        if mirror {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::from(Any)
        }
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let methods = if is_any(&cors.allowed_methods) {
        if mirror {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::from(Any)
        }
    } else {
        let methods: Vec<Method> = cors
            .allowed_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .collect();
        AllowMethods::list(methods)
    };

    let headers = if is_any(&cors.allowed_headers) {
        if mirror {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::from(Any)
        }
    } else {
        let headers: Vec<HeaderName> = cors
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        AllowHeaders::list(headers)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(cors.allow_credentials)
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_module_prefixes_are_unique() {
        let modules = feature_modules();
        let mut prefixes: Vec<&str> = modules.iter().map(|m| m.prefix).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), modules.len());
        assert!(prefixes.iter().all(|p| p.starts_with('/')));
    }

    #[test]
    fn test_cors_layer_accepts_wildcards_with_credentials() {
        // Must not panic: wildcard plus credentials is mirrored
        let _ = cors_layer(&CorsConfig::default());

        let _ = cors_layer(&CorsConfig {
            allowed_origins: vec!["https://app.example".to_string()],
            allowed_methods: vec!["get".to_string(), "POST".to_string()],
            allowed_headers: vec!["authorization".to_string()],
            allow_credentials: true,
        });
    }
}
