/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded migrations, undo and scaffolding
/// - `pagination`: page parameters and the paginated response envelope
/// - `seeds`: idempotent seed data
///
/// # Example
///
/// ```no_run
/// use groundwork_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pagination;
pub mod pool;
pub mod seeds;
