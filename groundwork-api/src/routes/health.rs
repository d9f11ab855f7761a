/// Health check endpoints
///
/// Provides two public endpoints:
/// - `GET /`: server information (timezone, current time, version)
/// - `GET /health`: database and token store connectivity
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.0.1",
///   "database": "connected",
///   "token_store": "memory"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Server information response
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerInfo {
    pub timezone: String,

    /// Current time, RFC 3339
    pub time: String,

    pub version: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Token store backend and status, e.g. `redis` or `redis (unreachable)`
    pub token_store: String,
}

pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(ServerInfo {
        timezone: state.config.app.timezone.clone(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        version: state.config.app.version.clone(),
    })
}

/// Health check handler
///
/// Returns 503 when the database is unreachable. A degraded token store is
/// reported but does not fail the check.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = groundwork_shared::db::pool::health_check(&state.db).await.is_ok();

    let token_store = if state.tokens.is_healthy().await {
        state.tokens.backend().to_string()
    } else {
        format!("{} (unreachable)", state.tokens.backend())
    };

    let (status, label) = if database_up {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: state.config.app.version.clone(),
            database: if database_up { "connected" } else { "disconnected" }.to_string(),
            token_store,
        }),
    )
}
