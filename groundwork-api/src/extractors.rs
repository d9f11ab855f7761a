/// Role-aware user extractors
///
/// Handlers declare the access level they need by their argument type:
///
/// ```text
/// async fn me(CurrentUser(user): CurrentUser) -> ...       any active user
/// async fn review(ModeratorUser(user): ModeratorUser) -> ... moderator or admin
/// async fn purge(AdminUser(user): AdminUser) -> ...         admin only
/// ```
///
/// Each extractor resolves the bearer token through the token store, loads
/// the user and checks the role. Rejections are [`ApiError`]s.

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use groundwork_shared::auth::authorization::{require_role, resolve_user, AccessLevel};
use groundwork_shared::auth::middleware::{bearer_token, AuthContext};
use groundwork_shared::locale::Message;
use groundwork_shared::models::user::User;

/// Any authenticated, active user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// A user with the moderator or admin role
#[derive(Debug, Clone)]
pub struct ModeratorUser(pub User);

/// A user with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

/// The bearer token of the request
///
/// Prefers the context left by the JWT guard and falls back to the header
/// on excluded paths.
pub fn request_token(parts: &Parts) -> Option<String> {
    if let Some(context) = parts.extensions.get::<AuthContext>() {
        return Some(context.token.clone());
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned)
}

async fn authorize(parts: &Parts, state: &AppState, level: AccessLevel) -> Result<User, ApiError> {
    let token = request_token(parts).ok_or_else(|| ApiError::unauthorized(Message::TokenInvalid))?;

    let user = resolve_user(&state.db, &state.sessions(), &token).await?;
    require_role(&state.db, &user, level).await?;

    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(parts, state, AccessLevel::User).await.map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ModeratorUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(parts, state, AccessLevel::Moderator)
            .await
            .map(ModeratorUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(parts, state, AccessLevel::Admin).await.map(AdminUser)
    }
}
