//! # Groundwork API Server
//!
//! Loads configuration from the environment, connects to PostgreSQL, picks a
//! token store (Redis when `REDIS_URL` is set, otherwise in-process memory)
//! and serves the versioned router until SIGINT or SIGTERM.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p groundwork-api
//! ```

use groundwork_api::{
    app::{build_router, AppState},
    config::Config,
};
use groundwork_shared::{
    auth::token_store::{MemoryTokenStore, RedisTokenStore, TokenStore},
    db::pool::{close_pool, create_pool},
    logging::{init_logging, server_span},
    redis::RedisClient,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log);

    tracing::info!(
        "{} v{} starting...",
        config.app.name,
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(config.database.clone()).await?;

    let tokens: Arc<dyn TokenStore> = match &config.redis {
        Some(redis) => Arc::new(RedisTokenStore::new(RedisClient::new(redis.clone()).await?)),
        None => {
            tracing::warn!("REDIS_URL not set, tokens are kept in process memory");
            Arc::new(MemoryTokenStore::new())
        }
    };

    let span = server_span(&config.log);
    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config, tokens)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&address).await?;
    span.in_scope(|| tracing::info!("Server listening on http://{}", address));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future()
        .instrument(span)
        .await?;

    tracing::info!("Shutdown signal received, closing database pool...");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
