/// JWT guard middleware
///
/// Runs every request through the shared [`AuthGuard`]. Excluded paths pass
/// untouched; everything else needs a valid bearer token, and the resulting
/// [`AuthContext`] is inserted into request extensions for extractors.
///
/// CORS sits outside this layer, so preflight requests are answered before
/// the guard sees them.
///
/// [`AuthGuard`]: groundwork_shared::auth::middleware::AuthGuard
/// [`AuthContext`]: groundwork_shared::auth::middleware::AuthContext

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // A header that is not visible ASCII cannot be a bearer token
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_owned());

    let context = state
        .guard
        .authorize(req.uri().path(), authorization.as_deref())
        .await?;

    if let Some(context) = context {
        req.extensions_mut().insert(context);
    }

    Ok(next.run(req).await)
}
