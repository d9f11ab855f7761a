/// Middleware modules for the API server
///
/// Layer order, outermost first:
/// - `locale`: request language scope
/// - tower-http `TraceLayer` and `logging`: spans and status-level request logs
/// - CORS (tower-http)
/// - `auth`: JWT guard with excluded paths

pub mod auth;
pub mod locale;
pub mod logging;
